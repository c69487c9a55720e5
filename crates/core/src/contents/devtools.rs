//! Developer-inspection controls.

use std::path::Path;
use std::sync::Arc;

use tether_protocol::DevToolsOptions;
use tether_runtime::{Error, Result};
use tokio::sync::oneshot;

use super::WebContents;
use crate::events::EventKind;
use crate::native::InspectionHost;

impl WebContents {
	fn inspector(&self) -> Result<Arc<dyn InspectionHost>> {
		self.native()?
			.inspector()
			.ok_or_else(|| Error::Unsupported("developer tools".into()))
	}

	pub fn open_devtools(&self, options: DevToolsOptions) -> Result<()> {
		let inspector = self.inspector()?;
		if inspector.is_opened() {
			return Ok(());
		}
		inspector.open(&options);
		self.host()?.emit(self.id(), EventKind::DevToolsOpened);
		Ok(())
	}

	pub fn close_devtools(&self) -> Result<()> {
		let inspector = self.inspector()?;
		if !inspector.is_opened() {
			return Ok(());
		}
		inspector.close();
		self.host()?.emit(self.id(), EventKind::DevToolsClosed);
		Ok(())
	}

	pub fn is_devtools_opened(&self) -> Result<bool> {
		Ok(self.inspector()?.is_opened())
	}

	pub fn toggle_devtools(&self) -> Result<()> {
		if self.is_devtools_opened()? {
			self.close_devtools()
		} else {
			self.open_devtools(DevToolsOptions::default())
		}
	}

	/// Opens the inspector if needed and selects the element at `(x, y)`.
	pub fn inspect_element(&self, x: i32, y: i32) -> Result<()> {
		self.open_devtools(DevToolsOptions::default())?;
		self.inspector()?.inspect_element(x, y);
		Ok(())
	}

	pub fn inspect_service_worker(&self) -> Result<()> {
		self.inspector()?.inspect_service_worker();
		Ok(())
	}

	pub fn add_workspace(&self, path: impl AsRef<Path>) -> Result<()> {
		self.inspector()?.add_workspace(path.as_ref());
		Ok(())
	}

	pub fn remove_workspace(&self, path: impl AsRef<Path>) -> Result<()> {
		self.inspector()?.remove_workspace(path.as_ref());
		Ok(())
	}

	/// Whether a service worker controls the current page.
	pub async fn has_service_worker(&self) -> Result<bool> {
		let (tx, rx) = oneshot::channel();
		self.native()?.has_service_worker(Box::new(move |found| {
			let _ = tx.send(found);
		}));
		rx.await.map_err(|_| Error::ChannelClosed)
	}

	/// Unregisters the page's service worker. Resolves false if none was registered.
	pub async fn unregister_service_worker(&self) -> Result<bool> {
		let (tx, rx) = oneshot::channel();
		self.native()?.unregister_service_worker(Box::new(move |done| {
			let _ = tx.send(done);
		}));
		rx.await.map_err(|_| Error::ChannelClosed)
	}
}
