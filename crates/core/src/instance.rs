//! Per-instance state held by the registry.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tether_runtime::{InstanceId, NavigationTracker};

use crate::contents::HandleInner;
use crate::guest::GuestEmbedding;
use crate::native::NativeContents;

/// How an instance relates to its native engine object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
	/// Created fresh for a host window; owns its native object.
	HostWindowOwned,
	/// Created fresh inside an embedder; owns its native object.
	GuestEmbedded,
	/// Wraps a native object owned elsewhere.
	RemoteWrapped,
}

impl Kind {
	pub fn owns_native(self) -> bool {
		!matches!(self, Kind::RemoteWrapped)
	}
}

/// Host-side display flags changed through policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayState {
	pub fullscreen: bool,
	pub responsive: bool,
}

impl Default for DisplayState {
	fn default() -> Self {
		Self {
			fullscreen: false,
			responsive: true,
		}
	}
}

/// Registry entry binding an id to its native object and host-side state.
pub struct TrackedInstance {
	id: InstanceId,
	kind: Kind,
	native: Arc<dyn NativeContents>,
	/// Never owning; the scripting runtime decides the handle's lifetime.
	handle: Mutex<Weak<HandleInner>>,
	navigation: Mutex<NavigationTracker>,
	guest: Option<Mutex<GuestEmbedding>>,
	display: Mutex<DisplayState>,
}

impl TrackedInstance {
	pub(crate) fn new(id: InstanceId, kind: Kind, native: Arc<dyn NativeContents>, guest: Option<GuestEmbedding>) -> Self {
		debug_assert_eq!(guest.is_some(), kind == Kind::GuestEmbedded);
		Self {
			id,
			kind,
			native,
			handle: Mutex::new(Weak::new()),
			navigation: Mutex::new(NavigationTracker::new()),
			guest: guest.map(Mutex::new),
			display: Mutex::new(DisplayState::default()),
		}
	}

	pub fn id(&self) -> InstanceId {
		self.id
	}

	pub fn kind(&self) -> Kind {
		self.kind
	}

	pub fn native(&self) -> &Arc<dyn NativeContents> {
		&self.native
	}

	pub(crate) fn handle(&self) -> &Mutex<Weak<HandleInner>> {
		&self.handle
	}

	pub(crate) fn navigation(&self) -> &Mutex<NavigationTracker> {
		&self.navigation
	}

	pub(crate) fn guest(&self) -> Option<&Mutex<GuestEmbedding>> {
		self.guest.as_ref()
	}

	/// Embedder id for guests.
	pub fn embedder(&self) -> Option<InstanceId> {
		self.guest.as_ref().map(|guest| guest.lock().embedder)
	}

	pub fn display(&self) -> DisplayState {
		*self.display.lock()
	}

	/// Applies `update` and returns the previous state.
	pub(crate) fn update_display(&self, update: impl FnOnce(&mut DisplayState)) -> DisplayState {
		let mut display = self.display.lock();
		let previous = *display;
		update(&mut display);
		previous
	}
}

impl std::fmt::Debug for TrackedInstance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TrackedInstance")
			.field("id", &self.id)
			.field("kind", &self.kind)
			.field("native", &self.native.native_key())
			.field("state", &self.navigation.lock().state())
			.finish()
	}
}
