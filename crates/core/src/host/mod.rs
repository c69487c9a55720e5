//! [`ContentsHost`]: the coordinator owning every tracked instance.
//!
//! The host binds three lifetimes together: the scripting-runtime handle
//! ([`WebContents`], held weakly), the native engine object (owned through
//! the registry unless wrapped) and the content-process link (owned by the
//! router). Every entry point resolves the id through the registry first, so
//! nothing reaches the native layer once teardown has begun.

mod messaging;
mod signals;
mod teardown;

use std::sync::Arc;

use parking_lot::RwLock;
use tether_runtime::{Error, InstanceId, Lookup, Ownership, Registry, Result, Router};
use tokio::sync::{broadcast, watch};

pub use self::signals::EngineSignal;
use self::teardown::Release;
use crate::config::{ContentsOptions, HostConfig};
use crate::contents::{HandleInner, WebContents};
use crate::events::{ContentsEvent, EventBus, EventKind, EventSink};
use crate::guest::GuestEmbedding;
use crate::handlers::MessageHandlers;
use crate::instance::{Kind, TrackedInstance};
use crate::native::{NativeContents, NativeFactory};
use crate::policy::{DefaultPolicy, PolicyAuthority};

pub(crate) struct HostShared {
	pub(crate) config: HostConfig,
	pub(crate) registry: Registry<TrackedInstance>,
	pub(crate) router: Router,
	pub(crate) factory: Arc<dyn NativeFactory>,
	pub(crate) policy: RwLock<Arc<dyn PolicyAuthority>>,
	pub(crate) events: EventBus,
	pub(crate) handlers: MessageHandlers,
	pub(crate) shutdown: watch::Sender<bool>,
}

/// Coordinates instances created by one engine factory.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ContentsHost {
	pub(crate) shared: Arc<HostShared>,
}

impl ContentsHost {
	pub fn new(config: HostConfig, factory: Arc<dyn NativeFactory>) -> Self {
		let router = Router::new().with_reply_timeout(config.sync_reply_timeout());
		let events = EventBus::new(config.event_capacity);
		let (shutdown, _) = watch::channel(false);
		Self {
			shared: Arc::new(HostShared {
				config,
				registry: Registry::new(),
				router,
				factory,
				policy: RwLock::new(Arc::new(DefaultPolicy)),
				events,
				handlers: MessageHandlers::new(),
				shutdown,
			}),
		}
	}

	pub fn with_policy(self, policy: Arc<dyn PolicyAuthority>) -> Self {
		self.set_policy(policy);
		self
	}

	/// Replaces the policy authority for subsequent requests.
	pub fn set_policy(&self, policy: Arc<dyn PolicyAuthority>) {
		*self.shared.policy.write() = policy;
	}

	pub fn config(&self) -> &HostConfig {
		&self.shared.config
	}

	/// Constructs a fresh engine object and tracks it.
	///
	/// With `options.embedder` set the instance is a guest of that instance,
	/// otherwise it is owned by a host window.
	///
	/// # Errors
	///
	/// `InstanceDestroyed`/`NotFound` if the embedder is dead, `LimitExceeded`
	/// when `max_instances` are alive, or whatever the factory reports.
	pub fn create(&self, options: ContentsOptions) -> Result<WebContents> {
		self.ensure_capacity()?;
		let guest = match options.embedder {
			Some(embedder) => {
				self.instance(embedder)?;
				Some(GuestEmbedding::new(embedder, options.size, options.transparent))
			}
			None => None,
		};
		let kind = if guest.is_some() { Kind::GuestEmbedded } else { Kind::HostWindowOwned };

		let native = self.shared.factory.create(&options)?;
		if let Some(user_agent) = options.user_agent.as_deref().or(self.shared.config.user_agent.as_deref()) {
			native.set_user_agent(user_agent);
		}
		if let Some(embedding) = &guest {
			native.set_size(&embedding.size);
			native.set_allow_transparency(embedding.allow_transparency);
		}

		let key = native.native_key();
		let id = self
			.shared
			.registry
			.create_with(Ownership::Owned(key), |id| TrackedInstance::new(id, kind, Arc::clone(&native), guest));
		let instance = self.instance(id)?;

		// The embedder may have been torn down while the engine object was built.
		if let Some(embedder) = instance.embedder() {
			if !self.is_alive(embedder) {
				self.teardown(id, Release::Native);
				return Err(Error::InstanceDestroyed(embedder));
			}
		}

		self.connect_content(&instance)?;
		tracing::debug!(%id, ?kind, native = %key, "created instance");
		self.emit(id, EventKind::Created { kind });
		Ok(self.handle_for(&instance))
	}

	/// Tracks a native object owned elsewhere.
	///
	/// Wrapping an object that is already tracked returns the existing handle.
	/// The wrapper never releases the native object.
	pub fn create_from(&self, native: Arc<dyn NativeContents>) -> Result<WebContents> {
		let key = native.native_key();
		if let Some(existing) = self.shared.registry.find_native(key) {
			tracing::debug!(id = %existing, native = %key, "native already tracked");
			return self.contents(existing);
		}
		self.ensure_capacity()?;

		let id = self
			.shared
			.registry
			.create_with(Ownership::Borrowed(key), |id| TrackedInstance::new(id, Kind::RemoteWrapped, native, None));
		let instance = self.instance(id)?;
		self.connect_content(&instance)?;
		tracing::debug!(%id, native = %key, "wrapped native instance");
		self.emit(id, EventKind::Created { kind: Kind::RemoteWrapped });
		Ok(self.handle_for(&instance))
	}

	/// Handle for a live instance.
	pub fn contents(&self, id: InstanceId) -> Result<WebContents> {
		let instance = self.instance(id)?;
		Ok(self.handle_for(&instance))
	}

	pub fn lookup(&self, id: InstanceId) -> Lookup<TrackedInstance> {
		self.shared.registry.lookup(id)
	}

	pub fn is_alive(&self, id: InstanceId) -> bool {
		self.shared.registry.is_alive(id)
	}

	/// Ids of every live instance.
	pub fn instances(&self) -> Vec<InstanceId> {
		self.shared.registry.alive().into_iter().map(|(id, _)| id).collect()
	}

	/// Broadcast receiver for every event emitted after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<ContentsEvent> {
		self.shared.events.subscribe()
	}

	pub fn add_sink(&self, sink: Arc<dyn EventSink>) {
		self.shared.events.add_sink(sink);
	}

	pub(crate) fn from_shared(shared: Arc<HostShared>) -> Self {
		Self { shared }
	}

	pub(crate) fn instance(&self, id: InstanceId) -> Result<Arc<TrackedInstance>> {
		self.shared.registry.get(id)
	}

	pub(crate) fn policy(&self) -> Arc<dyn PolicyAuthority> {
		Arc::clone(&*self.shared.policy.read())
	}

	pub(crate) fn emit(&self, id: InstanceId, kind: EventKind) {
		self.shared.events.emit(id, kind);
	}

	/// Returns the instance's existing handle, or binds a new one.
	pub(crate) fn handle_for(&self, instance: &TrackedInstance) -> WebContents {
		let mut slot = instance.handle().lock();
		if let Some(inner) = slot.upgrade() {
			return WebContents::from_inner(inner);
		}
		let inner = Arc::new(HandleInner::new(instance.id(), Arc::downgrade(&self.shared)));
		*slot = Arc::downgrade(&inner);
		WebContents::from_inner(inner)
	}

	/// Opens a new content link and hands the content half to the engine.
	pub(crate) fn connect_content(&self, instance: &TrackedInstance) -> Result<()> {
		let endpoint = self.shared.router.attach(instance.id())?;
		instance.native().attach_content(endpoint);
		Ok(())
	}

	fn ensure_capacity(&self) -> Result<()> {
		let max = self.shared.config.max_instances;
		if self.shared.registry.len() >= max {
			return Err(Error::LimitExceeded(max));
		}
		Ok(())
	}
}

impl std::fmt::Debug for ContentsHost {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ContentsHost")
			.field("instances", &self.shared.registry.len())
			.finish()
	}
}
