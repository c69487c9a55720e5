//! Handler registry for inbound content-process messages.
//!
//! Handlers are stored as [`HandlerEntry<E, ChannelMeta>`] in an [`IndexMap`]
//! for O(1) removal and stable insertion order, and are removed again when
//! their [`Subscription`] drops.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tether_protocol::Payload;
use tether_runtime::{InstanceId, ReplySlot, Result};

/// Unique identifier for message handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new globally-unique handler ID.
pub fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

/// Boxed async handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Handler function: `E` → async `Result<()>`.
pub type HandlerFn<E> = Arc<dyn Fn(E) -> HandlerFuture + Send + Sync>;

/// Handler entry with metadata `M`.
pub struct HandlerEntry<E, M = ()> {
	pub id: HandlerId,
	pub meta: M,
	pub handler: HandlerFn<E>,
}

impl<E, M: Clone> Clone for HandlerEntry<E, M> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			meta: self.meta.clone(),
			handler: Arc::clone(&self.handler),
		}
	}
}

/// Handler storage: [`IndexMap`] for O(1) removal with stable insertion order.
pub type HandlerMap<E, M = ()> = Arc<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>>;

/// Which instance and channel a handler listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
	pub instance: InstanceId,
	pub channel: String,
}

impl ChannelMeta {
	fn matches(&self, instance: InstanceId, channel: &str) -> bool {
		self.instance == instance && self.channel == channel
	}
}

/// Fire-and-forget message from a content process.
#[derive(Debug, Clone, PartialEq)]
pub struct IpcMessage {
	pub instance: InstanceId,
	pub channel: String,
	pub payload: Payload,
}

/// Content-process request awaiting exactly one reply.
///
/// Dropping it without calling [`respond`](Self::respond) answers with an
/// empty payload.
#[derive(Debug)]
pub struct SyncMessage {
	pub instance: InstanceId,
	pub channel: String,
	pub payload: Payload,
	pub reply: ReplySlot,
}

impl SyncMessage {
	pub fn respond(self, payload: Payload) -> Result<()> {
		self.reply.send(payload)
	}
}

/// RAII handle that unregisters a handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the owning
/// host is gone is safe (becomes a no-op).
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Arc<dyn Fn(HandlerId) + Send + Sync>>,
}

impl Subscription {
	/// Subscription that calls `dropper` with `id` when released.
	pub fn new(id: HandlerId, dropper: Arc<dyn Fn(HandlerId) + Send + Sync>) -> Self {
		Self { id, dropper: Some(dropper) }
	}

	/// Subscription removing `id` from `handlers`; inert once the map is gone.
	pub fn from_handler_map<E, M>(id: HandlerId, handlers: &HandlerMap<E, M>) -> Self
	where
		E: Send + Sync + 'static,
		M: Send + Sync + 'static,
	{
		let weak: Weak<Mutex<IndexMap<HandlerId, HandlerEntry<E, M>>>> = Arc::downgrade(handlers);
		let dropper = Arc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				map.lock().shift_remove(&id);
			}
		});
		Self::new(id, dropper)
	}

	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Keeps the handler registered for the lifetime of its instance.
	pub fn detach(mut self) {
		self.dropper = None;
	}

	/// Same as dropping the subscription.
	pub fn unsubscribe(self) {
		drop(self);
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}

/// Per-host handler tables.
pub(crate) struct MessageHandlers {
	messages: HandlerMap<IpcMessage, ChannelMeta>,
	requests: HandlerMap<SyncMessage, ChannelMeta>,
}

impl MessageHandlers {
	pub(crate) fn new() -> Self {
		Self {
			messages: Arc::new(Mutex::new(IndexMap::new())),
			requests: Arc::new(Mutex::new(IndexMap::new())),
		}
	}

	pub(crate) fn on_message(&self, meta: ChannelMeta, handler: HandlerFn<IpcMessage>) -> Subscription {
		let id = next_handler_id();
		self.messages.lock().insert(id, HandlerEntry { id, meta, handler });
		Subscription::from_handler_map(id, &self.messages)
	}

	pub(crate) fn on_request(&self, meta: ChannelMeta, handler: HandlerFn<SyncMessage>) -> Subscription {
		let id = next_handler_id();
		self.requests.lock().insert(id, HandlerEntry { id, meta, handler });
		Subscription::from_handler_map(id, &self.requests)
	}

	/// Runs every matching message handler in registration order.
	pub(crate) async fn dispatch_message(&self, message: IpcMessage) {
		let handlers: Vec<_> = {
			let map = self.messages.lock();
			map.values()
				.filter(|entry| entry.meta.matches(message.instance, &message.channel))
				.map(|entry| (entry.id, Arc::clone(&entry.handler)))
				.collect()
		};

		for (handler_id, handler) in handlers {
			if let Err(e) = handler(message.clone()).await {
				tracing::error!(handler_id, id = %message.instance, channel = %message.channel, error = %e, "message handler failed");
			}
		}
	}

	/// Hands a request to the first matching handler.
	///
	/// With no handler the request is dropped, which answers it empty.
	pub(crate) async fn dispatch_request(&self, request: SyncMessage) {
		let handler = {
			let map = self.requests.lock();
			map.values()
				.find(|entry| entry.meta.matches(request.instance, &request.channel))
				.map(|entry| (entry.id, Arc::clone(&entry.handler)))
		};

		match handler {
			Some((handler_id, handler)) => {
				let (instance, channel) = (request.instance, request.channel.clone());
				if let Err(e) = handler(request).await {
					tracing::error!(handler_id, id = %instance, %channel, error = %e, "request handler failed");
				}
			}
			None => {
				tracing::debug!(id = %request.instance, channel = %request.channel, "no request handler, answering empty");
			}
		}
	}

	/// Drops every handler registered for `instance`.
	pub(crate) fn forget(&self, instance: InstanceId) {
		self.messages.lock().retain(|_, entry| entry.meta.instance != instance);
		self.requests.lock().retain(|_, entry| entry.meta.instance != instance);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicBool, AtomicUsize};

	use serde_json::json;
	use tether_protocol::HostToContent;
	use tether_runtime::{Error, Router};

	use super::*;

	fn meta(instance: u64, channel: &str) -> ChannelMeta {
		ChannelMeta {
			instance: InstanceId::from_raw(instance),
			channel: channel.into(),
		}
	}

	fn message(instance: u64, channel: &str) -> IpcMessage {
		IpcMessage {
			instance: InstanceId::from_raw(instance),
			channel: channel.into(),
			payload: vec![json!(1)],
		}
	}

	fn noop<E: 'static>() -> HandlerFn<E> {
		Arc::new(|_: E| -> HandlerFuture { Box::pin(async { Ok(()) }) })
	}

	#[test]
	fn test_handler_id_increments() {
		let id1 = next_handler_id();
		let id2 = next_handler_id();
		assert!(id2 > id1);
	}

	#[test]
	fn test_subscription_drop() {
		let called = Arc::new(AtomicBool::new(false));
		let called_clone = Arc::clone(&called);
		let dropper = Arc::new(move |_id: HandlerId| {
			called_clone.store(true, Ordering::SeqCst);
		});

		{
			let _sub = Subscription::new(1, dropper);
			assert!(!called.load(Ordering::SeqCst));
		}
		assert!(called.load(Ordering::SeqCst));
	}

	#[test]
	fn test_subscription_removes_handler() {
		let handlers = MessageHandlers::new();
		let sub = handlers.on_message(meta(1, "a"), noop());
		assert_eq!(handlers.messages.lock().len(), 1);
		sub.unsubscribe();
		assert!(handlers.messages.lock().is_empty());
	}

	#[test]
	fn test_subscription_detach_keeps_handler() {
		let handlers = MessageHandlers::new();
		handlers.on_message(meta(1, "a"), noop()).detach();
		assert_eq!(handlers.messages.lock().len(), 1);
	}

	#[tokio::test]
	async fn test_dispatch_filters_by_instance_and_channel() {
		let handlers = MessageHandlers::new();
		let hits = Arc::new(AtomicUsize::new(0));

		let counter = Arc::clone(&hits);
		let _sub = handlers.on_message(
			meta(1, "greet"),
			Arc::new(move |_: IpcMessage| -> HandlerFuture {
				counter.fetch_add(1, Ordering::SeqCst);
				Box::pin(async { Ok(()) })
			}),
		);

		handlers.dispatch_message(message(1, "greet")).await;
		handlers.dispatch_message(message(1, "other")).await;
		handlers.dispatch_message(message(2, "greet")).await;
		assert_eq!(hits.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn test_failing_handler_does_not_stop_others() {
		let handlers = MessageHandlers::new();
		let reached = Arc::new(AtomicBool::new(false));

		let _failing = handlers.on_message(
			meta(1, "x"),
			Arc::new(|_: IpcMessage| -> HandlerFuture { Box::pin(async { Err(Error::InvalidArgument("boom".into())) }) }),
		);
		let flag = Arc::clone(&reached);
		let _second = handlers.on_message(
			meta(1, "x"),
			Arc::new(move |_: IpcMessage| -> HandlerFuture {
				flag.store(true, Ordering::SeqCst);
				Box::pin(async { Ok(()) })
			}),
		);

		handlers.dispatch_message(message(1, "x")).await;
		assert!(reached.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn test_unhandled_request_answers_empty() {
		let router = Router::new();
		let instance = InstanceId::from_raw(1);
		let mut endpoint = router.attach(instance).unwrap();
		let handlers = MessageHandlers::new();

		handlers
			.dispatch_request(SyncMessage {
				instance,
				channel: "nobody".into(),
				payload: vec![],
				reply: router.reply_slot(instance, 3),
			})
			.await;

		assert_eq!(
			endpoint.try_recv(),
			Some(HostToContent::Reply {
				request_id: 3,
				payload: vec![],
			})
		);
	}

	#[tokio::test]
	async fn test_request_handler_replies() {
		let router = Router::new();
		let instance = InstanceId::from_raw(1);
		let mut endpoint = router.attach(instance).unwrap();
		let handlers = MessageHandlers::new();
		let _sub = handlers.on_request(
			meta(1, "double"),
			Arc::new(|request: SyncMessage| -> HandlerFuture {
				Box::pin(async move {
					let n = request.payload[0].as_i64().unwrap_or_default();
					request.respond(vec![json!(n * 2)])
				})
			}),
		);

		handlers
			.dispatch_request(SyncMessage {
				instance,
				channel: "double".into(),
				payload: vec![json!(21)],
				reply: router.reply_slot(instance, 1),
			})
			.await;

		assert_eq!(
			endpoint.try_recv(),
			Some(HostToContent::Reply {
				request_id: 1,
				payload: vec![json!(42)],
			})
		);
		assert!(endpoint.try_recv().is_none());
	}

	#[test]
	fn test_forget_removes_instance_handlers() {
		let handlers = MessageHandlers::new();
		handlers.on_message(meta(1, "a"), noop()).detach();
		handlers.on_message(meta(2, "a"), noop()).detach();
		handlers.on_request(meta(1, "b"), noop()).detach();

		handlers.forget(InstanceId::from_raw(1));
		assert_eq!(handlers.messages.lock().len(), 1);
		assert!(handlers.requests.lock().is_empty());
	}
}
