//! Engine-originated callbacks.

use std::path::PathBuf;

use tether_protocol::{FaviconUrl, NavigationDetails, ResourceRedirect, ResourceResponse, TerminationStatus};
use tether_runtime::{CancelReason, InstanceId, LoadFailure, Lookup, NavigationSignal, Transition};

use super::ContentsHost;
use super::teardown::Release;
use crate::events::{EventKind, favicon_urls};
use crate::instance::TrackedInstance;
use crate::policy::ConsoleEntry;

/// Callbacks the native engine reports for an instance.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
	DidStartLoading,
	/// The main-resource request was issued.
	RequestSent,
	DidStopLoading,
	DidFinishLoad {
		is_main_frame: bool,
	},
	/// Navigation failed before committing.
	DidFailProvisionalLoad {
		url: String,
		code: i32,
		description: String,
		is_main_frame: bool,
	},
	/// Committed navigation failed to finish.
	DidFailLoad {
		url: String,
		code: i32,
		description: String,
		is_main_frame: bool,
	},
	ProcessGone(TerminationStatus),
	DidNavigateMainFrame(NavigationDetails),
	NavigationEntryCommitted {
		url: String,
		is_in_page: bool,
		did_replace_entry: bool,
	},
	TitleWasSet {
		title: String,
		explicit: bool,
	},
	FaviconUrlsUpdated(Vec<FaviconUrl>),
	ResponseStarted(ResourceResponse),
	Redirected(ResourceRedirect),
	PluginCrashed {
		path: PathBuf,
		pid: u32,
	},
	BeforeUnloadFired {
		proceed: bool,
	},
	/// A frame finished parsing its document.
	DocumentLoaded {
		is_main_frame: bool,
	},
	RenderViewDeleted {
		process_id: u32,
	},
	/// Console output; routed through the policy like a delegate request.
	ConsoleMessage(ConsoleEntry),
	/// The engine destroyed the native object on its own.
	NativeDestroyed,
}

impl ContentsHost {
	/// Applies an engine callback to an instance.
	///
	/// Callbacks for dead instances are dropped. Engine failures become
	/// events; nothing here returns an error.
	pub fn on_engine_signal(&self, id: InstanceId, signal: EngineSignal) {
		let instance = match self.lookup(id) {
			Lookup::Alive(instance) => instance,
			_ => {
				tracing::debug!(%id, ?signal, "engine signal for dead instance (ignored)");
				return;
			}
		};

		match signal {
			EngineSignal::DidStartLoading => {
				let transition = advance(&instance, NavigationSignal::DidStartLoading);
				if transition.recovered() {
					tracing::info!(%id, "content process restarted");
					if let Err(e) = self.connect_content(&instance) {
						tracing::warn!(%id, error = %e, "failed to reconnect content process");
					}
				}
				if transition.started_run() {
					self.emit(id, EventKind::DidStartLoading);
				}
			}
			EngineSignal::RequestSent => {
				advance(&instance, NavigationSignal::RequestSent);
			}
			EngineSignal::DidStopLoading => {
				if advance(&instance, NavigationSignal::DidStopLoading).stopped_run() {
					self.emit(id, EventKind::DidStopLoading);
				}
			}
			EngineSignal::DidFinishLoad { is_main_frame } => {
				self.emit(id, EventKind::DidFinishLoad { is_main_frame });
			}
			EngineSignal::DidFailProvisionalLoad {
				url,
				code,
				description,
				is_main_frame,
			} => self.record_failure(&instance, LoadFailure { url, code, description, provisional: true }, is_main_frame),
			EngineSignal::DidFailLoad {
				url,
				code,
				description,
				is_main_frame,
			} => self.record_failure(&instance, LoadFailure { url, code, description, provisional: false }, is_main_frame),
			EngineSignal::ProcessGone(status) => {
				let transition = advance(&instance, NavigationSignal::ProcessGone(status));
				let released = self.shared.router.cancel_pending(id, CancelReason::Crashed);
				tracing::warn!(%id, ?status, released, "content process gone");
				if transition.changed() {
					self.emit(id, EventKind::Crashed { status });
				}
				// Close the interrupted run.
				if transition.interrupted_run() {
					self.emit(id, EventKind::DidStopLoading);
				}
			}
			EngineSignal::DidNavigateMainFrame(details) => {
				self.emit(id, EventKind::DidNavigate { details });
			}
			EngineSignal::NavigationEntryCommitted {
				url,
				is_in_page,
				did_replace_entry,
			} => {
				self.emit(
					id,
					EventKind::EntryCommitted {
						url,
						is_in_page,
						did_replace_entry,
					},
				);
			}
			EngineSignal::TitleWasSet { title, explicit } => {
				self.emit(id, EventKind::TitleUpdated { title, explicit });
			}
			EngineSignal::FaviconUrlsUpdated(candidates) => {
				self.emit(id, EventKind::FaviconUpdated { urls: favicon_urls(&candidates) });
			}
			EngineSignal::ResponseStarted(response) => self.emit(id, EventKind::ResponseStarted(response)),
			EngineSignal::Redirected(redirect) => self.emit(id, EventKind::Redirected(redirect)),
			EngineSignal::PluginCrashed { path, pid } => {
				tracing::warn!(%id, path = %path.display(), pid, "plugin crashed");
				self.emit(id, EventKind::PluginCrashed { path, pid });
			}
			EngineSignal::BeforeUnloadFired { proceed } => {
				self.emit(id, EventKind::BeforeUnloadFired { proceed });
			}
			EngineSignal::DocumentLoaded { is_main_frame } => {
				if is_main_frame {
					self.emit(id, EventKind::DomReady);
				}
			}
			EngineSignal::RenderViewDeleted { process_id } => {
				self.emit(id, EventKind::RenderViewDeleted { process_id });
			}
			EngineSignal::ConsoleMessage(entry) => {
				drop(instance);
				if let Err(e) = self.request_console_message(id, entry) {
					tracing::debug!(%id, error = %e, "console message dropped");
				}
			}
			EngineSignal::NativeDestroyed => {
				drop(instance);
				self.teardown(id, Release::AlreadyGone);
			}
		}
	}

	fn record_failure(&self, instance: &TrackedInstance, failure: LoadFailure, is_main_frame: bool) {
		let id = instance.id();
		tracing::debug!(%id, code = failure.code, description = %failure.description, provisional = failure.provisional, "load failed");
		if is_main_frame {
			advance(instance, NavigationSignal::DidFail(failure.clone()));
		}
		self.emit(id, EventKind::DidFailLoad { failure, is_main_frame });
	}
}

fn advance(instance: &TrackedInstance, signal: NavigationSignal) -> Transition {
	instance.navigation().lock().apply(&signal)
}
