//! [`WebContents`]: the scripting-runtime handle for one tracked instance.
//!
//! A handle names its instance by id and holds the host weakly. Every method
//! resolves the id through the registry first; once the instance is torn
//! down, calls fail with `InstanceDestroyed` and never reach the engine.

mod devtools;
mod editing;
mod messaging;
mod navigation;
mod printing;

use std::sync::{Arc, Weak};

use tether_runtime::{Error, InstanceId, Result};

use crate::host::{ContentsHost, HostShared};
use crate::instance::{Kind, TrackedInstance};
use crate::native::NativeContents;

pub(crate) struct HandleInner {
	id: InstanceId,
	host: Weak<HostShared>,
}

impl HandleInner {
	pub(crate) fn new(id: InstanceId, host: Weak<HostShared>) -> Self {
		Self { id, host }
	}
}

/// Handle to a tracked instance.
///
/// Clones refer to the same handle; the host hands out the same handle for
/// an id for as long as any clone is alive.
#[derive(Clone)]
pub struct WebContents {
	inner: Arc<HandleInner>,
}

impl WebContents {
	pub(crate) fn from_inner(inner: Arc<HandleInner>) -> Self {
		Self { inner }
	}

	pub fn id(&self) -> InstanceId {
		self.inner.id
	}

	/// The owning host.
	///
	/// # Errors
	///
	/// `InstanceDestroyed` once the host itself has been dropped.
	pub fn host(&self) -> Result<ContentsHost> {
		self.inner
			.host
			.upgrade()
			.map(ContentsHost::from_shared)
			.ok_or(Error::InstanceDestroyed(self.inner.id))
	}

	pub(crate) fn instance(&self) -> Result<Arc<TrackedInstance>> {
		self.host()?.instance(self.id())
	}

	pub(crate) fn native(&self) -> Result<Arc<dyn NativeContents>> {
		Ok(Arc::clone(self.instance()?.native()))
	}

	/// Downcasts the engine object to its concrete type.
	pub fn native_as<T: NativeContents>(&self) -> Result<Arc<T>> {
		self.native()?
			.downcast_arc::<T>()
			.map_err(|_| Error::InvalidArgument(format!("instance {} is backed by another engine type", self.id())))
	}

	pub fn is_alive(&self) -> bool {
		self.host().map(|host| host.is_alive(self.id())).unwrap_or(false)
	}

	/// See [`ContentsHost::destroy`].
	pub fn destroy(&self) -> bool {
		match self.host() {
			Ok(host) => host.destroy(self.id()),
			Err(_) => false,
		}
	}

	pub fn kind(&self) -> Result<Kind> {
		Ok(self.instance()?.kind())
	}

	pub fn title(&self) -> Result<String> {
		Ok(self.native()?.title())
	}

	/// URL of the last committed navigation.
	pub fn url(&self) -> Result<Option<url::Url>> {
		Ok(self.native()?.url())
	}

	pub fn set_user_agent(&self, user_agent: &str) -> Result<()> {
		self.native()?.set_user_agent(user_agent);
		Ok(())
	}

	pub fn user_agent(&self) -> Result<String> {
		Ok(self.native()?.user_agent())
	}

	pub fn insert_css(&self, css: &str) -> Result<()> {
		self.native()?.insert_css(css);
		Ok(())
	}

	/// Queues `code` for evaluation in the main frame.
	pub fn execute_script(&self, code: &str) -> Result<()> {
		self.native()?.execute_script(code);
		Ok(())
	}

	pub fn focus(&self) -> Result<()> {
		self.native()?.focus();
		Ok(())
	}

	pub fn tab_traverse(&self, reverse: bool) -> Result<()> {
		self.native()?.tab_traverse(reverse);
		Ok(())
	}

	pub fn set_audio_muted(&self, muted: bool) -> Result<()> {
		self.native()?.set_audio_muted(muted);
		Ok(())
	}

	pub fn is_audio_muted(&self) -> Result<bool> {
		Ok(self.native()?.is_audio_muted())
	}

	pub fn is_fullscreen(&self) -> Result<bool> {
		Ok(self.instance()?.display().fullscreen)
	}

	/// False after the instance reported itself unresponsive.
	pub fn is_responsive(&self) -> Result<bool> {
		Ok(self.instance()?.display().responsive)
	}
}

impl PartialEq for WebContents {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for WebContents {}

impl std::fmt::Debug for WebContents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WebContents").field("id", &self.id()).finish()
	}
}
