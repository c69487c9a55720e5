//! Host and per-instance configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_protocol::SizeParams;
use tether_runtime::{InstanceId, Result};

/// Configuration for a [`ContentsHost`](crate::ContentsHost).
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
	/// User agent applied to new instances that do not set their own.
	pub user_agent: Option<String>,
	/// Capacity of the broadcast event channel.
	pub event_capacity: usize,
	/// Upper bound on waiting for a synchronous reply, in milliseconds.
	/// `None` waits until the reply, a crash or a destroy.
	pub sync_reply_timeout_ms: Option<u64>,
	/// Maximum number of live instances.
	pub max_instances: usize,
}

impl Default for HostConfig {
	fn default() -> Self {
		Self {
			user_agent: None,
			event_capacity: 256,
			sync_reply_timeout_ms: None,
			max_instances: 1024,
		}
	}
}

impl HostConfig {
	/// Parses a JSON configuration document.
	pub fn from_json_str(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub fn sync_reply_timeout(&self) -> Option<Duration> {
		self.sync_reply_timeout_ms.map(Duration::from_millis)
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	pub fn with_sync_reply_timeout(mut self, timeout: Duration) -> Self {
		self.sync_reply_timeout_ms = Some(timeout.as_millis() as u64);
		self
	}

	pub fn with_max_instances(mut self, max: usize) -> Self {
		self.max_instances = max;
		self
	}
}

/// Options for constructing a fresh engine instance.
///
/// Naming an `embedder` makes the new instance a guest of that instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentsOptions {
	pub embedder: Option<InstanceId>,
	/// Storage partition name, passed to the engine untouched.
	pub partition: Option<String>,
	pub user_agent: Option<String>,
	/// Allow a transparent background (guests only).
	pub transparent: bool,
	pub size: Option<SizeParams>,
}

impl ContentsOptions {
	/// Options for a guest embedded in `embedder`.
	pub fn guest_of(embedder: InstanceId) -> Self {
		Self {
			embedder: Some(embedder),
			..Self::default()
		}
	}

	pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
		self.partition = Some(partition.into());
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	pub fn with_size(mut self, size: SizeParams) -> Self {
		self.size = Some(size);
		self
	}

	pub fn is_guest(&self) -> bool {
		self.embedder.is_some()
	}
}
