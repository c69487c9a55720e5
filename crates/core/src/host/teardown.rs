//! Instance destruction.
//!
//! Order for one instance:
//! 1. Remove it from the registry (later lookups and nested destroys see it dead)
//! 2. Tear down its guests, depth first
//! 3. Release pending requests with `InstanceDestroyed` and drop the content link
//! 4. Drop its message handlers and emit `destroyed`
//! 5. Release the native object, if owned and still alive

use tether_runtime::InstanceId;

use super::ContentsHost;
use crate::events::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Release {
	/// Release the native object if the instance owns it.
	Native,
	/// The engine already destroyed the native object.
	AlreadyGone,
}

impl ContentsHost {
	/// Destroys an instance and every guest embedded in it.
	///
	/// Returns false if the instance was already dead. Safe to call from
	/// callbacks of the instance being destroyed.
	pub fn destroy(&self, id: InstanceId) -> bool {
		self.teardown(id, Release::Native)
	}

	pub(crate) fn teardown(&self, id: InstanceId, release: Release) -> bool {
		let Some(instance) = self.shared.registry.destroy(id) else {
			tracing::trace!(%id, "destroy on dead instance (no-op)");
			return false;
		};
		tracing::debug!(%id, kind = ?instance.kind(), "tearing down instance");

		for guest in self.guests_of(id) {
			self.teardown(guest, Release::Native);
		}

		let released = self.shared.router.detach(id);
		if released > 0 {
			tracing::debug!(%id, released, "released pending requests on destroy");
		}
		self.shared.handlers.forget(id);
		self.emit(id, EventKind::Destroyed);

		if release == Release::Native && instance.kind().owns_native() {
			instance.native().release();
		}
		true
	}

	/// Destroys every instance and stops the dispatch loop.
	pub fn shutdown(&self) {
		for (id, instance) in self.shared.registry.alive() {
			if instance.embedder().is_none() {
				self.destroy(id);
			}
		}
		// Guests whose embedder vanished between snapshots.
		for (id, _) in self.shared.registry.alive() {
			self.destroy(id);
		}
		self.shared.shutdown.send_replace(true);
		tracing::debug!("host shut down");
	}
}
