//! Content-process message dispatch.
//!
//! The dispatch loop never awaits a handler. Replies to host requests are
//! resolved inline, events are published in arrival order, and handlers run
//! on per-lane tasks keyed by instance and channel. Handlers on one lane see
//! messages in arrival order; lanes never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tether_protocol::{ContentToHost, Mode, Payload};
use tether_runtime::{Inbound, InstanceId, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{ContentsHost, HostShared};
use crate::events::EventKind;
use crate::handlers::{IpcMessage, SyncMessage};

/// Inbound message waiting for its handlers.
enum Delivery {
	Message(IpcMessage),
	Request(SyncMessage),
}

type LaneKey = (InstanceId, String);

/// Handler queues owned by the dispatch loop.
struct Lanes {
	shared: Weak<HostShared>,
	queues: HashMap<LaneKey, mpsc::UnboundedSender<Delivery>>,
}

impl Lanes {
	fn new(shared: Weak<HostShared>) -> Self {
		Self {
			shared,
			queues: HashMap::new(),
		}
	}

	/// Queues `delivery` behind earlier messages on the same lane.
	fn push(&mut self, key: LaneKey, delivery: Delivery) {
		let delivery = match self.queues.get(&key) {
			Some(queue) => match queue.send(delivery) {
				Ok(()) => return,
				Err(mpsc::error::SendError(delivery)) => delivery,
			},
			None => delivery,
		};

		self.prune();
		let (queue, rx) = mpsc::unbounded_channel();
		let _ = queue.send(delivery);
		tokio::spawn(run_lane(Weak::clone(&self.shared), key.0, rx));
		self.queues.insert(key, queue);
	}

	/// Drops lanes whose worker exited or whose instance is gone.
	fn prune(&mut self) {
		let Some(shared) = self.shared.upgrade() else {
			self.queues.clear();
			return;
		};
		self.queues
			.retain(|(id, _), queue| !queue.is_closed() && shared.registry.is_alive(*id));
	}

	fn len(&self) -> usize {
		self.queues.len()
	}
}

/// Runs the handlers of one lane until the instance dies or the loop stops.
async fn run_lane(shared: Weak<HostShared>, id: InstanceId, mut queue: mpsc::UnboundedReceiver<Delivery>) {
	while let Some(delivery) = queue.recv().await {
		let Some(shared) = shared.upgrade() else { break };
		let host = ContentsHost::from_shared(shared);
		if !host.is_alive(id) {
			tracing::debug!(%id, "instance gone, closing handler lane");
			break;
		}
		host.deliver(delivery).await;
	}
}

impl ContentsHost {
	/// Sends to an instance's content process.
	///
	/// `Async` returns once queued. `SyncAwaitingReply` resolves with the
	/// reply, or with `InstanceCrashed` / `InstanceDestroyed` as soon as the
	/// instance crashes or is destroyed.
	pub async fn send(&self, id: InstanceId, channel: &str, payload: Payload, mode: Mode) -> Result<Option<Payload>> {
		self.instance(id)?;
		self.shared.router.send(id, channel, payload, mode).await
	}

	/// Spawns [`run`](Self::run) on the current tokio runtime.
	pub fn start(&self) -> JoinHandle<()> {
		tokio::spawn(self.clone().run())
	}

	/// Drains the inbound queue until shutdown or until the host is dropped.
	///
	/// Handlers may await synchronous sends to any instance, their own
	/// included; replies keep flowing while they wait.
	pub async fn run(self) {
		let Some(mut inbound) = self.shared.router.take_inbound() else {
			tracing::warn!("dispatch loop already running");
			return;
		};
		let mut shutdown = self.shared.shutdown.subscribe();
		if *shutdown.borrow() {
			return;
		}
		let shared = Arc::downgrade(&self.shared);
		drop(self);

		let mut lanes = Lanes::new(Weak::clone(&shared));
		tracing::debug!("dispatch loop started");
		loop {
			tokio::select! {
				message = inbound.recv() => {
					let Some(message) = message else { break };
					let Some(shared) = shared.upgrade() else { break };
					if let Some((key, delivery)) = ContentsHost::from_shared(shared).accept_inbound(message) {
						lanes.push(key, delivery);
					}
				}
				_ = shutdown.changed() => break,
			}
		}
		tracing::debug!(lanes = lanes.len(), "dispatch loop stopped");
	}

	/// Resolves replies and publishes the event for everything else.
	///
	/// Returns the lane and delivery for messages that still need handlers.
	fn accept_inbound(&self, inbound: Inbound) -> Option<(LaneKey, Delivery)> {
		let Inbound { instance: id, message } = self.shared.router.route_inbound(inbound)?;
		if !self.is_alive(id) {
			tracing::debug!(%id, "message for dead instance (ignored)");
			return None;
		}

		match message {
			ContentToHost::Message { channel, payload } => {
				tracing::debug!(%id, %channel, "message from content");
				self.emit(
					id,
					EventKind::IpcMessage {
						channel: channel.clone(),
						payload: payload.clone(),
					},
				);
				let message = IpcMessage {
					instance: id,
					channel: channel.clone(),
					payload,
				};
				Some(((id, channel), Delivery::Message(message)))
			}
			ContentToHost::Request {
				request_id,
				channel,
				payload,
			} => {
				tracing::debug!(%id, %channel, request_id, "request from content");
				self.emit(
					id,
					EventKind::IpcMessageSync {
						channel: channel.clone(),
						payload: payload.clone(),
					},
				);
				let request = SyncMessage {
					instance: id,
					channel: channel.clone(),
					payload,
					reply: self.shared.router.reply_slot(id, request_id),
				};
				Some(((id, channel), Delivery::Request(request)))
			}
			ContentToHost::Reply { .. } => None,
		}
	}

	async fn deliver(&self, delivery: Delivery) {
		match delivery {
			Delivery::Message(message) => self.shared.handlers.dispatch_message(message).await,
			Delivery::Request(request) => self.shared.handlers.dispatch_request(request).await,
		}
	}
}
