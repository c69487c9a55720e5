//! Links between the host and a content process.
//!
//! The host writes [`HostToContent`] envelopes through a [`ContentTransport`].
//! Messages coming back are pushed into the router's single inbound queue as
//! [`Inbound`] items, which keeps FIFO order per connection.
//!
//! [`channel_pair`] builds an in-process link backed by tokio channels. The
//! content half, [`ContentEndpoint`], is what an engine binding (or a test)
//! uses to play the content-process role.

use std::sync::atomic::{AtomicU32, Ordering};

use tether_protocol::{ContentToHost, HostToContent, Payload, RequestId};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::registry::InstanceId;

/// A message received from a content process.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
	pub instance: InstanceId,
	pub message: ContentToHost,
}

/// Sender for the router's inbound queue.
pub type InboundSender = mpsc::UnboundedSender<Inbound>;

/// Outbound half of a host/content link.
pub trait ContentTransport: Send + Sync {
	/// Queues a message for the content process without waiting.
	fn post(&self, message: HostToContent) -> Result<()>;

	/// Returns true once the content side has gone away.
	fn is_closed(&self) -> bool {
		false
	}
}

/// [`ContentTransport`] over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
	tx: mpsc::UnboundedSender<HostToContent>,
}

impl ContentTransport for ChannelTransport {
	fn post(&self, message: HostToContent) -> Result<()> {
		self.tx.send(message).map_err(|_| Error::ChannelClosed)
	}

	fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

/// Content-process side of an in-process link.
#[derive(Debug)]
pub struct ContentEndpoint {
	instance: InstanceId,
	rx: mpsc::UnboundedReceiver<HostToContent>,
	inbound: InboundSender,
	last_request_id: AtomicU32,
}

/// Creates a linked transport/endpoint pair for `instance`.
pub fn channel_pair(instance: InstanceId, inbound: InboundSender) -> (ChannelTransport, ContentEndpoint) {
	let (tx, rx) = mpsc::unbounded_channel();
	(
		ChannelTransport { tx },
		ContentEndpoint {
			instance,
			rx,
			inbound,
			last_request_id: AtomicU32::new(0),
		},
	)
}

impl ContentEndpoint {
	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	/// Receives the next message from the host.
	///
	/// Returns `None` once the host has dropped the link.
	pub async fn recv(&mut self) -> Option<HostToContent> {
		self.rx.recv().await
	}

	/// Non-blocking variant of [`recv`](Self::recv).
	pub fn try_recv(&mut self) -> Option<HostToContent> {
		self.rx.try_recv().ok()
	}

	/// Posts a fire-and-forget message to the host.
	pub fn send(&self, channel: &str, payload: Payload) -> Result<()> {
		self.push(ContentToHost::Message {
			channel: channel.to_string(),
			payload,
		})
	}

	/// Posts a request to the host and returns its correlation id.
	///
	/// The matching [`HostToContent::Reply`] arrives through [`recv`](Self::recv).
	pub fn request(&self, channel: &str, payload: Payload) -> Result<RequestId> {
		let request_id = self.last_request_id.fetch_add(1, Ordering::SeqCst) + 1;
		self.push(ContentToHost::Request {
			request_id,
			channel: channel.to_string(),
			payload,
		})?;
		Ok(request_id)
	}

	/// Answers a host request.
	pub fn reply(&self, request_id: RequestId, payload: Payload) -> Result<()> {
		self.push(ContentToHost::Reply { request_id, payload })
	}

	fn push(&self, message: ContentToHost) -> Result<()> {
		self.inbound
			.send(Inbound {
				instance: self.instance,
				message,
			})
			.map_err(|_| Error::ChannelClosed)
	}
}
