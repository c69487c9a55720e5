//! Tether runtime - instance registry, navigation tracking and message routing
//!
//! This crate provides the low-level coordination pieces the host builds on:
//!
//! - **Registry**: generation-checked ids with single-owner native claims
//! - **Navigation**: per-instance loading state driven by engine callbacks
//! - **Router**: request/reply correlation with crash and destroy cancellation
//! - **Transport**: host/content links and the inbound message queue
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   tether    │  ContentsHost, WebContents, policy, guests
//! └──────┬──────┘
//!        │
//! ┌──────▼──────────┐
//! │ tether-runtime  │  This crate
//! │  ┌──────────┐   │
//! │  │ Registry │   │  InstanceId -> TrackedInstance
//! │  └──────────┘   │
//! │  ┌──────────┐   │
//! │  │ Router   │   │  Request correlation, cancellation
//! │  └──────────┘   │
//! │  ┌──────────┐   │
//! │  │ Transport│   │  ContentTransport / ContentEndpoint
//! │  └──────────┘   │
//! └─────────────────┘
//! ```

pub mod error;
pub mod navigation;
pub mod registry;
pub mod router;
pub mod transport;

pub use error::{Error, Result};
pub use navigation::{LoadFailure, NavigationSignal, NavigationState, NavigationTracker, Transition};
pub use registry::{InstanceId, Lookup, NativeKey, Ownership, Registry};
pub use router::{CancelReason, ReplySlot, Router};
pub use transport::{ChannelTransport, ContentEndpoint, ContentTransport, Inbound, InboundSender, channel_pair};
