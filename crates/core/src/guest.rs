//! Guest embedding: instances composited inside another instance.
//!
//! A guest keeps a back-reference to its embedder. Tearing down an embedder
//! tears down its guests first (see [`ContentsHost::destroy`]).

use tether_protocol::SizeParams;
use tether_runtime::{Error, InstanceId, Result};

use crate::contents::WebContents;
use crate::events::EventKind;
use crate::host::ContentsHost;

/// Embedding state of a guest instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestEmbedding {
	pub embedder: InstanceId,
	pub size: SizeParams,
	pub allow_transparency: bool,
}

impl GuestEmbedding {
	pub(crate) fn new(embedder: InstanceId, size: Option<SizeParams>, allow_transparency: bool) -> Self {
		Self {
			embedder,
			size: size.unwrap_or_default(),
			allow_transparency,
		}
	}
}

impl ContentsHost {
	/// Merges `params` into a guest's size and forwards the result to the engine.
	///
	/// # Errors
	///
	/// `NotAGuest` for non-guests; `InvalidArgument` if the merged bounds
	/// would have a minimum larger than the maximum.
	pub fn set_guest_size(&self, id: InstanceId, params: SizeParams) -> Result<()> {
		let instance = self.instance(id)?;
		let guest = instance.guest().ok_or(Error::NotAGuest(id))?;

		let merged = {
			let mut embedding = guest.lock();
			let mut candidate = embedding.size;
			candidate.merge(&params);
			if candidate.has_inverted_bounds() {
				return Err(Error::InvalidArgument(format!("minimum size exceeds maximum size for guest {id}")));
			}
			embedding.size = candidate;
			candidate
		};

		tracing::debug!(%id, ?merged, "guest resized");
		instance.native().set_size(&merged);
		self.emit(id, EventKind::GuestResized { params: merged });
		Ok(())
	}

	pub fn set_guest_transparency(&self, id: InstanceId, allow: bool) -> Result<()> {
		let instance = self.instance(id)?;
		let guest = instance.guest().ok_or(Error::NotAGuest(id))?;
		guest.lock().allow_transparency = allow;
		instance.native().set_allow_transparency(allow);
		Ok(())
	}

	/// Live guests embedded directly in `embedder`.
	pub fn guests_of(&self, embedder: InstanceId) -> Vec<InstanceId> {
		self.shared
			.registry
			.alive()
			.into_iter()
			.filter(|(_, instance)| instance.embedder() == Some(embedder))
			.map(|(id, _)| id)
			.collect()
	}
}

impl WebContents {
	/// See [`ContentsHost::set_guest_size`].
	pub fn set_size(&self, params: SizeParams) -> Result<()> {
		self.host()?.set_guest_size(self.id(), params)
	}

	pub fn set_allow_transparency(&self, allow: bool) -> Result<()> {
		self.host()?.set_guest_transparency(self.id(), allow)
	}

	pub fn is_guest(&self) -> Result<bool> {
		Ok(self.instance()?.guest().is_some())
	}

	/// Current embedding state, for guests.
	pub fn guest_embedding(&self) -> Result<Option<GuestEmbedding>> {
		Ok(self.instance()?.guest().map(|guest| guest.lock().clone()))
	}

	/// Handle of the embedding instance, for guests.
	pub fn embedder(&self) -> Result<Option<WebContents>> {
		match self.instance()?.embedder() {
			Some(embedder) => self.host()?.contents(embedder).map(Some),
			None => Ok(None),
		}
	}
}
