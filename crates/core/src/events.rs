//! Observable events and the sinks that receive them.
//!
//! Every engine callback, delegate decision and lifecycle change is published
//! as a [`ContentsEvent`]. Events reach registered [`EventSink`]s
//! synchronously and broadcast subscribers asynchronously.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tether_protocol::{
	ConsoleLevel, FaviconUrl, NavigationDetails, Payload, Rect, ResourceRedirect, ResourceResponse, SizeParams, TerminationStatus,
	WindowDisposition,
};
use tether_runtime::{InstanceId, LoadFailure};
use tokio::sync::broadcast;

use crate::instance::Kind;

/// An event about one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentsEvent {
	pub id: InstanceId,
	pub kind: EventKind,
}

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
	Created { kind: Kind },
	Destroyed,
	DidStartLoading,
	DidStopLoading,
	DidFinishLoad { is_main_frame: bool },
	DidFailLoad { failure: LoadFailure, is_main_frame: bool },
	DomReady,
	Crashed { status: TerminationStatus },
	DidNavigate { details: NavigationDetails },
	EntryCommitted { url: String, is_in_page: bool, did_replace_entry: bool },
	TitleUpdated { title: String, explicit: bool },
	FaviconUpdated { urls: Vec<String> },
	ResponseStarted(ResourceResponse),
	Redirected(ResourceRedirect),
	PluginCrashed { path: PathBuf, pid: u32 },
	BeforeUnloadFired { proceed: bool },
	RenderViewDeleted { process_id: u32 },
	ConsoleMessage { level: ConsoleLevel, message: String, line: u32, source_id: String },
	IpcMessage { channel: String, payload: Payload },
	IpcMessageSync { channel: String, payload: Payload },
	NewWindow { url: String, frame_name: String, disposition: WindowDisposition, allowed: bool },
	EnterFullscreen,
	LeaveFullscreen,
	Unresponsive,
	Responsive,
	MoveRequested { bounds: Rect },
	CloseRequested,
	ActivateRequested,
	GuestResized { params: SizeParams },
	DevToolsOpened,
	DevToolsClosed,
}

impl EventKind {
	/// Event name as seen by scripting-runtime listeners.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Created { .. } => "created",
			Self::Destroyed => "destroyed",
			Self::DidStartLoading => "did-start-loading",
			Self::DidStopLoading => "did-stop-loading",
			Self::DidFinishLoad { is_main_frame: true } => "did-finish-load",
			Self::DidFinishLoad { is_main_frame: false } => "did-frame-finish-load",
			Self::DidFailLoad { .. } => "did-fail-load",
			Self::DomReady => "dom-ready",
			Self::Crashed { .. } => "crashed",
			Self::DidNavigate { .. } => "did-navigate",
			Self::EntryCommitted { .. } => "navigation-entry-committed",
			Self::TitleUpdated { .. } => "page-title-updated",
			Self::FaviconUpdated { .. } => "page-favicon-updated",
			Self::ResponseStarted(_) => "did-get-response-details",
			Self::Redirected(_) => "did-get-redirect-request",
			Self::PluginCrashed { .. } => "plugin-crashed",
			Self::BeforeUnloadFired { .. } => "before-unload-fired",
			Self::RenderViewDeleted { .. } => "render-view-deleted",
			Self::ConsoleMessage { .. } => "console-message",
			Self::IpcMessage { .. } => "ipc-message",
			Self::IpcMessageSync { .. } => "ipc-message-sync",
			Self::NewWindow { .. } => "new-window",
			Self::EnterFullscreen => "enter-html-full-screen",
			Self::LeaveFullscreen => "leave-html-full-screen",
			Self::Unresponsive => "unresponsive",
			Self::Responsive => "responsive",
			Self::MoveRequested { .. } => "move",
			Self::CloseRequested => "close",
			Self::ActivateRequested => "activate",
			Self::GuestResized { .. } => "size-changed",
			Self::DevToolsOpened => "devtools-opened",
			Self::DevToolsClosed => "devtools-closed",
		}
	}
}

/// Receives every event synchronously, on the emitting thread.
pub trait EventSink: Send + Sync {
	fn on_event(&self, event: &ContentsEvent);
}

impl<F> EventSink for F
where
	F: Fn(&ContentsEvent) + Send + Sync,
{
	fn on_event(&self, event: &ContentsEvent) {
		self(event)
	}
}

pub(crate) struct EventBus {
	tx: broadcast::Sender<ContentsEvent>,
	sinks: RwLock<Vec<Arc<dyn EventSink>>>,
}

impl EventBus {
	pub(crate) fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity.max(1));
		Self {
			tx,
			sinks: RwLock::new(Vec::new()),
		}
	}

	pub(crate) fn subscribe(&self) -> broadcast::Receiver<ContentsEvent> {
		self.tx.subscribe()
	}

	pub(crate) fn add_sink(&self, sink: Arc<dyn EventSink>) {
		self.sinks.write().push(sink);
	}

	pub(crate) fn emit(&self, id: InstanceId, kind: EventKind) {
		tracing::trace!(%id, event = kind.name(), "emit");
		let event = ContentsEvent { id, kind };
		// Snapshot so a sink may register further sinks.
		let sinks: Vec<_> = self.sinks.read().clone();
		for sink in sinks {
			sink.on_event(&event);
		}
		let _ = self.tx.send(event);
	}
}

/// Filters favicon candidates down to usable icon URLs.
pub(crate) fn favicon_urls(candidates: &[FaviconUrl]) -> Vec<String> {
	candidates
		.iter()
		.filter(|candidate| candidate.icon_type != tether_protocol::FaviconType::Invalid && !candidate.url.is_empty())
		.map(|candidate| candidate.url.clone())
		.collect()
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;
	use tether_protocol::FaviconType;

	use super::*;

	#[test]
	fn sinks_and_subscribers_both_receive() {
		let bus = EventBus::new(8);
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink_seen = Arc::clone(&seen);
		bus.add_sink(Arc::new(move |event: &ContentsEvent| sink_seen.lock().push(event.kind.name())));
		let mut rx = bus.subscribe();

		bus.emit(InstanceId::from_raw(1), EventKind::DidStartLoading);

		assert_eq!(*seen.lock(), vec!["did-start-loading"]);
		let event = rx.try_recv().unwrap();
		assert_eq!(event.id, InstanceId::from_raw(1));
		assert_eq!(event.kind, EventKind::DidStartLoading);
	}

	#[test]
	fn emit_without_subscribers_is_fine() {
		let bus = EventBus::new(0);
		bus.emit(InstanceId::from_raw(2), EventKind::Destroyed);
	}

	#[test]
	fn frame_finish_names_differ() {
		assert_eq!(EventKind::DidFinishLoad { is_main_frame: true }.name(), "did-finish-load");
		assert_eq!(EventKind::DidFinishLoad { is_main_frame: false }.name(), "did-frame-finish-load");
	}

	#[test]
	fn invalid_favicons_are_dropped() {
		let urls = favicon_urls(&[
			FaviconUrl {
				url: "https://a.test/favicon.ico".into(),
				icon_type: FaviconType::Favicon,
			},
			FaviconUrl {
				url: "https://a.test/bad".into(),
				icon_type: FaviconType::Invalid,
			},
			FaviconUrl {
				url: String::new(),
				icon_type: FaviconType::TouchIcon,
			},
		]);
		assert_eq!(urls, vec!["https://a.test/favicon.ico".to_string()]);
	}
}
