//! Wire types for the tether host/content boundary.
//!
//! This crate contains the serde-serializable types exchanged between the
//! host process and a content process, plus the option and detail structs
//! carried by engine callbacks. They describe the shape of data only.
//!
//! Message arguments stay opaque JSON value sequences; nothing here looks
//! inside them.
//!
//! Lifecycle, routing and policy live in `tether-runtime` and `tether`.

pub mod message;
pub mod options;
pub mod types;

pub use message::*;
pub use options::*;
pub use types::*;
