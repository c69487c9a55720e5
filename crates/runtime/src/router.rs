//! Host-side message router.
//!
//! Correlates host requests with content-process replies and hands every other
//! inbound message to the host's dispatch loop.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Router::request`] with an instance id, channel and payload
//! 2. Router allocates a request id and parks a oneshot sender in the pending table
//! 3. The request is posted through the instance's [`ContentTransport`]
//! 4. Caller awaits the oneshot receiver
//! 5. The dispatch loop passes the content reply to [`Router::route_inbound`]
//! 6. The pending sender is removed and completed with the reply payload
//!
//! A crash goes through [`Router::cancel_pending`] and a destroy through
//! [`Router::detach`]. Both complete every parked sender for the instance with
//! an error in the same call.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tether_protocol::{ContentToHost, HostToContent, Mode, Payload, RequestId};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::registry::InstanceId;
use crate::transport::{ContentEndpoint, ContentTransport, Inbound, InboundSender, channel_pair};

/// Why pending requests of an instance were released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
	/// Content process terminated. Cleared when a new link is attached.
	Crashed,
	/// Instance torn down. Blocks the instance until it is detached.
	Destroyed,
}

impl CancelReason {
	pub fn error(self, id: InstanceId) -> Error {
		match self {
			CancelReason::Crashed => Error::InstanceCrashed(id),
			CancelReason::Destroyed => Error::InstanceDestroyed(id),
		}
	}
}

type ReplySender = oneshot::Sender<Result<Payload>>;

#[derive(Default)]
struct PendingTable {
	waiting: HashMap<InstanceId, HashMap<RequestId, ReplySender>>,
	closed: HashMap<InstanceId, CancelReason>,
}

impl PendingTable {
	fn take(&mut self, instance: InstanceId, request_id: RequestId) -> Option<ReplySender> {
		let requests = self.waiting.get_mut(&instance)?;
		let sender = requests.remove(&request_id);
		if requests.is_empty() {
			self.waiting.remove(&instance);
		}
		sender
	}
}

type SharedPending = Arc<Mutex<PendingTable>>;

/// Removes the pending entry when a request future is dropped before completion.
struct CancelGuard {
	instance: InstanceId,
	request_id: RequestId,
	pending: SharedPending,
	completed: bool,
}

impl CancelGuard {
	fn new(instance: InstanceId, request_id: RequestId, pending: SharedPending) -> Self {
		Self {
			instance,
			request_id,
			pending,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}
		if self.pending.lock().take(self.instance, self.request_id).is_some() {
			tracing::debug!(id = %self.instance, request_id = self.request_id, "removed abandoned request");
		}
	}
}

/// Future returned by [`Router::request`] with automatic cancellation cleanup.
struct ReplyFuture {
	rx: oneshot::Receiver<Result<Payload>>,
	guard: CancelGuard,
}

impl Future for ReplyFuture {
	type Output = Result<Payload>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Routes messages between the host and every attached content process.
pub struct Router {
	/// Sequential request id counter
	last_id: AtomicU32,
	links: DashMap<InstanceId, Arc<dyn ContentTransport>>,
	pending: SharedPending,
	inbound_tx: InboundSender,
	/// Taken once by the host dispatch loop
	inbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Inbound>>>,
	reply_timeout: Option<Duration>,
}

impl Default for Router {
	fn default() -> Self {
		Self::new()
	}
}

impl Router {
	pub fn new() -> Self {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		Self {
			last_id: AtomicU32::new(0),
			links: DashMap::new(),
			pending: Arc::new(Mutex::new(PendingTable::default())),
			inbound_tx,
			inbound_rx: Mutex::new(Some(inbound_rx)),
			reply_timeout: None,
		}
	}

	/// Bounds how long [`request`](Self::request) waits for a reply.
	pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.reply_timeout = timeout;
		self
	}

	/// Sender for custom transports to feed content messages into the router.
	pub fn inbound_sender(&self) -> InboundSender {
		self.inbound_tx.clone()
	}

	/// Takes the inbound queue. Only the first call returns `Some`.
	pub fn take_inbound(&self) -> Option<mpsc::UnboundedReceiver<Inbound>> {
		self.inbound_rx.lock().take()
	}

	/// Attaches an in-process link and returns the content half.
	pub fn attach(&self, id: InstanceId) -> Result<ContentEndpoint> {
		let (transport, endpoint) = channel_pair(id, self.inbound_tx.clone());
		self.attach_transport(id, Arc::new(transport))?;
		Ok(endpoint)
	}

	/// Attaches (or replaces) the outbound link of an instance.
	///
	/// Clears a crash mark, since a new link means a new content process.
	pub fn attach_transport(&self, id: InstanceId, transport: Arc<dyn ContentTransport>) -> Result<()> {
		let mut table = self.pending.lock();
		if table.closed.get(&id) == Some(&CancelReason::Destroyed) {
			return Err(Error::InstanceDestroyed(id));
		}
		table.closed.remove(&id);
		self.links.insert(id, transport);
		tracing::debug!(%id, "attached content link");
		Ok(())
	}

	pub fn is_attached(&self, id: InstanceId) -> bool {
		self.links.contains_key(&id)
	}

	/// Posts a fire-and-forget message.
	pub fn post(&self, id: InstanceId, channel: &str, payload: Payload) -> Result<()> {
		self.ensure_open(id)?;
		let link = self.link(id)?;
		tracing::debug!(%id, channel, "posting message");
		link.post(HostToContent::Message {
			channel: channel.to_string(),
			payload,
		})
	}

	/// Sends a request and waits for the correlated reply.
	///
	/// Fails with `InstanceCrashed` or `InstanceDestroyed` as soon as the
	/// instance is cancelled, and with `Timeout` if a reply timeout is set.
	pub async fn request(&self, id: InstanceId, channel: &str, payload: Payload) -> Result<Payload> {
		let (tx, rx) = oneshot::channel();
		let request_id = {
			let mut table = self.pending.lock();
			if let Some(reason) = table.closed.get(&id) {
				return Err(reason.error(id));
			}
			let requests = table.waiting.entry(id).or_default();
			// The counter wraps; skip ids still in flight.
			let request_id = loop {
				let candidate = self.last_id.fetch_add(1, Ordering::SeqCst);
				if !requests.contains_key(&candidate) {
					break candidate;
				}
			};
			requests.insert(request_id, tx);
			request_id
		};
		let guard = CancelGuard::new(id, request_id, Arc::clone(&self.pending));

		let link = self.link(id)?;
		tracing::debug!(%id, channel, request_id, "sending request");
		link.post(HostToContent::Request {
			request_id,
			channel: channel.to_string(),
			payload,
		})?;

		let response = ReplyFuture { rx, guard };
		match self.reply_timeout {
			Some(limit) => tokio::time::timeout(limit, response)
				.await
				.map_err(|_| Error::Timeout(format!("no reply on '{channel}' from instance {id} within {}ms", limit.as_millis())))?,
			None => response.await,
		}
	}

	/// Sends in either mode. Async sends resolve to `None`.
	pub async fn send(&self, id: InstanceId, channel: &str, payload: Payload, mode: Mode) -> Result<Option<Payload>> {
		match mode {
			Mode::Async => self.post(id, channel, payload).map(|()| None),
			Mode::SyncAwaitingReply => self.request(id, channel, payload).await.map(Some),
		}
	}

	/// Completes a pending request. Returns false if nothing was waiting.
	pub fn resolve(&self, id: InstanceId, request_id: RequestId, payload: Payload) -> bool {
		let sender = self.pending.lock().take(id, request_id);
		match sender {
			Some(tx) => {
				let _ = tx.send(Ok(payload));
				true
			}
			None => {
				tracing::debug!(%id, request_id, "reply for unknown request (ignored)");
				false
			}
		}
	}

	/// Resolves replies and passes everything else through.
	pub fn route_inbound(&self, inbound: Inbound) -> Option<Inbound> {
		match inbound.message {
			ContentToHost::Reply { request_id, payload } => {
				self.resolve(inbound.instance, request_id, payload);
				None
			}
			_ => Some(inbound),
		}
	}

	/// Fails every pending request of an instance and blocks new ones.
	///
	/// Returns the number of requests released.
	pub fn cancel_pending(&self, id: InstanceId, reason: CancelReason) -> usize {
		let waiting = {
			let mut table = self.pending.lock();
			if table.closed.get(&id) != Some(&CancelReason::Destroyed) {
				table.closed.insert(id, reason);
			}
			table.waiting.remove(&id).unwrap_or_default()
		};
		release(id, waiting, reason)
	}

	/// Drops the link and fails pending requests as destroyed.
	///
	/// Leaves no state behind for `id`. Later calls fail with `ChannelClosed`;
	/// the registry is what reports the instance as destroyed.
	pub fn detach(&self, id: InstanceId) -> usize {
		self.links.remove(&id);
		let waiting = {
			let mut table = self.pending.lock();
			table.closed.remove(&id);
			table.waiting.remove(&id).unwrap_or_default()
		};
		release(id, waiting, CancelReason::Destroyed)
	}

	pub fn pending_count(&self, id: InstanceId) -> usize {
		self.pending.lock().waiting.get(&id).map_or(0, HashMap::len)
	}

	/// Reply handle for a content-process request.
	pub fn reply_slot(&self, id: InstanceId, request_id: RequestId) -> ReplySlot {
		ReplySlot {
			instance: id,
			request_id,
			link: self.links.get(&id).map(|entry| Arc::clone(entry.value())),
			filled: false,
		}
	}

	fn link(&self, id: InstanceId) -> Result<Arc<dyn ContentTransport>> {
		self.links.get(&id).map(|entry| Arc::clone(entry.value())).ok_or(Error::ChannelClosed)
	}

	fn ensure_open(&self, id: InstanceId) -> Result<()> {
		match self.pending.lock().closed.get(&id) {
			Some(reason) => Err(reason.error(id)),
			None => Ok(()),
		}
	}
}

fn release(id: InstanceId, waiting: HashMap<RequestId, ReplySender>, reason: CancelReason) -> usize {
	let count = waiting.len();
	for (_, tx) in waiting {
		let _ = tx.send(Err(reason.error(id)));
	}
	if count > 0 {
		tracing::debug!(%id, count, ?reason, "released pending requests");
	}
	count
}

/// Reply owed to a content process that sent a request.
///
/// Filled at most once. Dropping an unfilled slot sends an empty payload so
/// the content process is never left waiting.
pub struct ReplySlot {
	instance: InstanceId,
	request_id: RequestId,
	link: Option<Arc<dyn ContentTransport>>,
	filled: bool,
}

impl ReplySlot {
	pub fn instance(&self) -> InstanceId {
		self.instance
	}

	pub fn request_id(&self) -> RequestId {
		self.request_id
	}

	/// Sends the reply, consuming the slot.
	pub fn send(mut self, payload: Payload) -> Result<()> {
		self.filled = true;
		self.deliver(payload)
	}

	fn deliver(&self, payload: Payload) -> Result<()> {
		match &self.link {
			Some(link) => link.post(HostToContent::Reply {
				request_id: self.request_id,
				payload,
			}),
			None => Err(Error::ChannelClosed),
		}
	}
}

impl Drop for ReplySlot {
	fn drop(&mut self) {
		if self.filled {
			return;
		}
		tracing::warn!(id = %self.instance, request_id = self.request_id, "request dropped without reply, answering empty");
		let _ = self.deliver(Vec::new());
	}
}

impl fmt::Debug for ReplySlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReplySlot")
			.field("instance", &self.instance)
			.field("request_id", &self.request_id)
			.field("filled", &self.filled)
			.finish()
	}
}
