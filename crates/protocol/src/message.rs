//! Envelopes crossing the host/content process boundary.
//!
//! A message is addressed by channel name and carries an ordered payload of
//! serialized values. Requests carry a correlation id and expect exactly one
//! [`Reply`](HostToContent::Reply) with the same id.
//!
//! # Main Types
//!
//! - [`HostToContent`] - Messages the host posts to a content process
//! - [`ContentToHost`] - Messages a content process posts to the host
//! - [`ChannelMessage`] - Direction-agnostic view used for logging and dispatch

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered message arguments.
pub type Payload = Vec<Value>;

/// Correlation id pairing a request with its reply.
pub type RequestId = u32;

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
	/// Host to content process.
	ToContentProcess,
	/// Content process to host.
	FromContentProcess,
}

/// Delivery mode of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
	/// Fire-and-forget.
	#[default]
	Async,
	/// Caller is suspended until the correlated reply arrives.
	SyncAwaitingReply,
}

/// Message posted by the host to a content process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostToContent {
	/// Fire-and-forget message.
	Message { channel: String, payload: Payload },
	/// Request awaiting a [`ContentToHost::Reply`].
	Request {
		request_id: RequestId,
		channel: String,
		payload: Payload,
	},
	/// Reply to a [`ContentToHost::Request`].
	Reply { request_id: RequestId, payload: Payload },
}

/// Message posted by a content process to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentToHost {
	/// Fire-and-forget message.
	Message { channel: String, payload: Payload },
	/// Request awaiting a [`HostToContent::Reply`].
	Request {
		request_id: RequestId,
		channel: String,
		payload: Payload,
	},
	/// Reply to a [`HostToContent::Request`].
	Reply { request_id: RequestId, payload: Payload },
}

/// Direction-agnostic view of a channel message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
	pub channel: String,
	pub direction: Direction,
	pub payload: Payload,
	pub mode: Mode,
}

impl HostToContent {
	/// Returns the channel view, or `None` for replies.
	pub fn as_channel_message(&self) -> Option<ChannelMessage> {
		let (channel, payload, mode) = match self {
			Self::Message { channel, payload } => (channel, payload, Mode::Async),
			Self::Request { channel, payload, .. } => (channel, payload, Mode::SyncAwaitingReply),
			Self::Reply { .. } => return None,
		};
		Some(ChannelMessage {
			channel: channel.clone(),
			direction: Direction::ToContentProcess,
			payload: payload.clone(),
			mode,
		})
	}
}

impl ContentToHost {
	/// Returns the channel view, or `None` for replies.
	pub fn as_channel_message(&self) -> Option<ChannelMessage> {
		let (channel, payload, mode) = match self {
			Self::Message { channel, payload } => (channel, payload, Mode::Async),
			Self::Request { channel, payload, .. } => (channel, payload, Mode::SyncAwaitingReply),
			Self::Reply { .. } => return None,
		};
		Some(ChannelMessage {
			channel: channel.clone(),
			direction: Direction::FromContentProcess,
			payload: payload.clone(),
			mode,
		})
	}
}
