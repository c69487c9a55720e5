//! tether: lifecycle and message coordination for embedded content-engine instances.
//!
//! A [`ContentsHost`] tracks every engine instance it creates or wraps,
//! follows each instance's navigation through engine callbacks, routes
//! messages to and from the instance's content process, consults a
//! [`PolicyAuthority`] for requests the page raises, and keeps guest
//! instances tied to their embedder.
//!
//! # Examples
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tether::headless::{self, HeadlessContents, HeadlessFactory};
//! use tether::{ContentsHost, ContentsOptions, HostConfig};
//!
//! #[tokio::main]
//! async fn main() -> tether::Result<()> {
//!     let host = ContentsHost::new(HostConfig::default(), Arc::new(HeadlessFactory::new()));
//!     host.start();
//!
//!     let contents = host.create(ContentsOptions::default())?;
//!     contents.load_url("https://example.test", Default::default())?;
//!     headless::drive_load(&contents, "Example")?;
//!     assert_eq!(contents.title()?, "Example");
//!
//!     let native = contents.native_as::<HeadlessContents>()?;
//!     if let Some(endpoint) = native.take_endpoint() {
//!         headless::spawn_responder(endpoint, |_, _| vec![json!("pong")]);
//!     }
//!     let reply = contents.send_sync("ping", vec![json!(1), json!(2), json!(3)]).await?;
//!     assert_eq!(reply, vec![json!("pong")]);
//!
//!     host.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Layers
//!
//! - [`tether_protocol`]: wire envelopes and detail types
//! - [`tether_runtime`]: registry, navigation tracker, message router
//! - this crate: the host, handles, policy and guest coordination

pub mod authority;
pub mod config;
pub mod contents;
pub mod events;
pub mod guest;
pub mod handlers;
pub mod headless;
pub mod host;
pub mod instance;
pub mod native;
pub mod policy;

pub use config::{ContentsOptions, HostConfig};
pub use contents::WebContents;
pub use events::{ContentsEvent, EventKind, EventSink};
pub use guest::GuestEmbedding;
pub use handlers::{HandlerId, IpcMessage, Subscription, SyncMessage};
pub use host::{ContentsHost, EngineSignal};
pub use instance::{DisplayState, Kind, TrackedInstance};
pub use native::{Completion, InspectionHost, NativeContents, NativeFactory, PdfRenderer};
pub use policy::{ConsoleEntry, DefaultPolicy, NewWindowRequest, PolicyAuthority, Verdict, WindowDecision};
pub use tether_protocol::{
	DevToolsOptions, EditCommand, LoadUrlOptions, Mode, Payload, PdfSettings, PrintOptions, Size, SizeParams, TerminationStatus,
	WindowDisposition,
};
pub use tether_runtime::{Error, InstanceId, LoadFailure, Lookup, NativeKey, NavigationState, Result};
