//! Seams to the native content engine.
//!
//! The engine itself is out of scope; the host talks to it only through
//! these traits. [`headless`](crate::headless) provides an in-memory
//! implementation.

use std::path::Path;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use tether_protocol::{DevToolsOptions, EditCommand, LoadUrlOptions, PdfSettings, PrintOptions, SizeParams};
use tether_runtime::{ContentEndpoint, NativeKey, Result};
use url::Url;

use crate::config::ContentsOptions;

/// One-shot completion callback handed to the engine.
pub type Completion<T> = Box<dyn FnOnce(T) + Send>;

/// A native engine object bound to one tracked instance.
///
/// Methods are fire-and-forget; the engine reports progress back through
/// [`ContentsHost::on_engine_signal`](crate::ContentsHost::on_engine_signal).
pub trait NativeContents: DowncastSync {
	/// Identity used to enforce single ownership.
	fn native_key(&self) -> NativeKey;

	/// Hands over the content half of a fresh host/content link.
	///
	/// Called on creation and again whenever the instance recovers from a
	/// crash with a new content process.
	fn attach_content(&self, endpoint: ContentEndpoint);

	fn load_url(&self, url: &Url, options: &LoadUrlOptions);
	fn stop(&self);
	fn reload(&self, ignore_cache: bool);
	fn go_back(&self);
	fn go_forward(&self);
	fn go_to_offset(&self, offset: i32);
	fn can_go_back(&self) -> bool;
	fn can_go_forward(&self) -> bool;

	/// URL of the last committed navigation.
	fn url(&self) -> Option<Url>;
	/// Title of the last committed page.
	fn title(&self) -> String;

	fn set_user_agent(&self, user_agent: &str);
	fn user_agent(&self) -> String;
	fn insert_css(&self, css: &str);
	fn execute_script(&self, code: &str);
	fn focus(&self);
	fn tab_traverse(&self, reverse: bool);
	fn edit(&self, command: EditCommand);

	fn set_audio_muted(&self, muted: bool);
	fn is_audio_muted(&self) -> bool;

	/// Starts a print job. Returns false if the engine refused.
	fn print(&self, options: &PrintOptions) -> bool;

	fn set_size(&self, params: &SizeParams);
	fn set_allow_transparency(&self, allow: bool);

	/// Destroys the engine object. Only called on owned instances.
	fn release(&self);

	fn inspector(&self) -> Option<Arc<dyn InspectionHost>> {
		None
	}

	fn pdf_renderer(&self) -> Option<Arc<dyn PdfRenderer>> {
		None
	}

	fn has_service_worker(&self, done: Completion<bool>) {
		done(false)
	}

	fn unregister_service_worker(&self, done: Completion<bool>) {
		done(false)
	}
}
impl_downcast!(sync NativeContents);

/// Developer-inspection frontend attached to an instance.
pub trait InspectionHost: Send + Sync {
	fn open(&self, options: &DevToolsOptions);
	fn close(&self);
	fn is_opened(&self) -> bool;
	fn inspect_element(&self, x: i32, y: i32);
	fn inspect_service_worker(&self);
	fn add_workspace(&self, path: &Path);
	fn remove_workspace(&self, path: &Path);
}

/// PDF generation backend.
pub trait PdfRenderer: Send + Sync {
	/// Renders the current page; `done` receives the document or a failure reason.
	fn print_to_pdf(&self, settings: &PdfSettings, done: Completion<std::result::Result<Vec<u8>, String>>);
}

/// Constructs fresh engine objects for [`ContentsHost::create`](crate::ContentsHost::create).
pub trait NativeFactory: Send + Sync {
	fn create(&self, options: &ContentsOptions) -> Result<Arc<dyn NativeContents>>;
}
