//! Host/content messaging on a handle.
//!
//! Handlers registered here run on the host's dispatch loop
//! ([`ContentsHost::run`](crate::ContentsHost::run)), one message at a time.

use std::future::Future;
use std::sync::Arc;

use tether_protocol::{Mode, Payload};
use tether_runtime::Result;

use super::WebContents;
use crate::handlers::{ChannelMeta, HandlerFn, HandlerFuture, IpcMessage, Subscription, SyncMessage};

impl WebContents {
	/// Posts a fire-and-forget message.
	///
	/// Returns false if the content process link is down (for example while
	/// crashed).
	///
	/// # Errors
	///
	/// `InstanceDestroyed` for dead instances.
	pub fn send_message(&self, channel: &str, args: Payload) -> Result<bool> {
		let host = self.host()?;
		host.instance(self.id())?;
		match host.shared.router.post(self.id(), channel, args) {
			Ok(()) => Ok(true),
			Err(e) => {
				tracing::debug!(id = %self.id(), %channel, error = %e, "message not delivered");
				Ok(false)
			}
		}
	}

	/// Sends a request and waits for the content process to reply.
	///
	/// # Errors
	///
	/// `InstanceCrashed` or `InstanceDestroyed` if that happens before the
	/// reply arrives; `Timeout` when a reply timeout is configured and elapses.
	pub async fn send_sync(&self, channel: &str, args: Payload) -> Result<Payload> {
		let reply = self.send(channel, args, Mode::SyncAwaitingReply).await?;
		Ok(reply.unwrap_or_default())
	}

	/// See [`ContentsHost::send`](crate::ContentsHost::send).
	pub async fn send(&self, channel: &str, args: Payload, mode: Mode) -> Result<Option<Payload>> {
		self.host()?.send(self.id(), channel, args, mode).await
	}

	/// Registers a handler for fire-and-forget messages on `channel`.
	///
	/// The handler stays registered until the returned [`Subscription`] is
	/// dropped or the instance is destroyed.
	pub fn on_message<F, Fut>(&self, channel: impl Into<String>, handler: F) -> Result<Subscription>
	where
		F: Fn(IpcMessage) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<()>> + Send + 'static,
	{
		let host = self.host()?;
		host.instance(self.id())?;
		let handler: HandlerFn<IpcMessage> = Arc::new(move |message: IpcMessage| -> HandlerFuture { Box::pin(handler(message)) });
		Ok(host.shared.handlers.on_message(self.meta(channel), handler))
	}

	/// Registers the handler for requests on `channel`.
	///
	/// The first registered handler answers; the reply is sent through
	/// [`SyncMessage::respond`]. A request no handler answers gets an empty
	/// reply.
	pub fn on_sync_message<F, Fut>(&self, channel: impl Into<String>, handler: F) -> Result<Subscription>
	where
		F: Fn(SyncMessage) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<()>> + Send + 'static,
	{
		let host = self.host()?;
		host.instance(self.id())?;
		let handler: HandlerFn<SyncMessage> = Arc::new(move |message: SyncMessage| -> HandlerFuture { Box::pin(handler(message)) });
		Ok(host.shared.handlers.on_request(self.meta(channel), handler))
	}

	fn meta(&self, channel: impl Into<String>) -> ChannelMeta {
		ChannelMeta {
			instance: self.id(),
			channel: channel.into(),
		}
	}
}
