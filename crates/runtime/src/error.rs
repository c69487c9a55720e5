//! Error types for the tether runtime.

use thiserror::Error;

use crate::registry::InstanceId;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the registry, router and the host built on top of them.
///
/// Engine-originated failures (load errors, crashes) are reported as events.
/// The variants here cover caller misuse and cancelled waits.
#[derive(Debug, Error)]
pub enum Error {
	/// Operation attempted on an instance that has been torn down.
	#[error("Instance {0} has been destroyed")]
	InstanceDestroyed(InstanceId),

	/// Content process for the instance terminated.
	#[error("Content process of instance {0} crashed")]
	InstanceCrashed(InstanceId),

	/// Guest-only operation on an instance that is not embedded.
	#[error("Instance {0} is not a guest")]
	NotAGuest(InstanceId),

	/// Navigation failed. Usually reported as an event rather than returned.
	#[error("Load failed ({code}): {description}")]
	LoadFailed { code: i32, description: String },

	/// The host policy rejected a request.
	#[error("Denied by host policy: {0}")]
	PolicyDenied(String),

	/// Id was never issued by this registry.
	#[error("Instance {0} not found")]
	NotFound(InstanceId),

	/// Link to the content process closed before the operation completed.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// Timeout waiting for a reply.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Engine does not provide the requested capability.
	#[error("Unsupported: {0}")]
	Unsupported(String),

	/// PDF rendering reported a failure.
	#[error("Printing failed: {0}")]
	PrintFailed(String),

	/// Invalid argument provided to method.
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),

	/// Live instance limit reached.
	#[error("Instance limit of {0} reached")]
	LimitExceeded(usize),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the target instance is gone, either destroyed or never known.
	pub fn is_destroyed(&self) -> bool {
		matches!(self, Error::InstanceDestroyed(_) | Error::NotFound(_))
	}

	/// Returns true if this is a crash error.
	pub fn is_crashed(&self) -> bool {
		matches!(self, Error::InstanceCrashed(_))
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if the host policy rejected the request.
	pub fn is_denied(&self) -> bool {
		matches!(self, Error::PolicyDenied(_))
	}

	/// Instance the error refers to, if any.
	pub fn instance(&self) -> Option<InstanceId> {
		match self {
			Error::InstanceDestroyed(id) | Error::InstanceCrashed(id) | Error::NotAGuest(id) | Error::NotFound(id) => Some(*id),
			_ => None,
		}
	}
}
