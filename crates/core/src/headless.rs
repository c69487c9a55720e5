//! In-memory engine for tests and the demo CLI.
//!
//! [`HeadlessContents`] keeps just enough state to answer the host (history,
//! title, user agent) and records every call it receives. It never raises
//! engine callbacks by itself; the `drive_*` functions play the callback
//! sequences a real engine would report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tether_protocol::{
	DevToolsOptions, EditCommand, HostToContent, LoadUrlOptions, NavigationDetails, Payload, PdfSettings, PrintOptions,
	ResourceResponse, SizeParams, TerminationStatus,
};
use tether_runtime::{ContentEndpoint, Error, NativeKey, Result};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::ContentsOptions;
use crate::contents::WebContents;
use crate::events::{ContentsEvent, EventSink};
use crate::host::EngineSignal;
use crate::native::{Completion, InspectionHost, NativeContents, NativeFactory, PdfRenderer};

pub const DEFAULT_USER_AGENT: &str = "tether-headless/1.0";

type ReleaseHook = Box<dyn FnOnce() + Send>;

#[derive(Debug)]
struct PageState {
	history: Vec<Url>,
	index: Option<usize>,
	pending: Option<Url>,
	/// The pending navigation reloads the current entry.
	replace_current: bool,
	title: String,
	user_agent: String,
	muted: bool,
	size: SizeParams,
	transparent: bool,
	service_worker: bool,
}

impl Default for PageState {
	fn default() -> Self {
		Self {
			history: Vec::new(),
			index: None,
			pending: None,
			replace_current: false,
			title: String::new(),
			user_agent: DEFAULT_USER_AGENT.to_string(),
			muted: false,
			size: SizeParams::default(),
			transparent: false,
			service_worker: false,
		}
	}
}

/// Headless engine object.
pub struct HeadlessContents {
	key: NativeKey,
	state: Mutex<PageState>,
	calls: Mutex<Vec<String>>,
	endpoint: Mutex<Option<ContentEndpoint>>,
	released: AtomicBool,
	release_log: Arc<Mutex<Vec<NativeKey>>>,
	on_release: Mutex<Option<ReleaseHook>>,
	inspector: Arc<HeadlessInspector>,
	pdf: Arc<HeadlessPdf>,
}

impl HeadlessContents {
	fn new(key: NativeKey, release_log: Arc<Mutex<Vec<NativeKey>>>) -> Self {
		Self {
			key,
			state: Mutex::new(PageState::default()),
			calls: Mutex::new(Vec::new()),
			endpoint: Mutex::new(None),
			released: AtomicBool::new(false),
			release_log,
			on_release: Mutex::new(None),
			inspector: Arc::new(HeadlessInspector::default()),
			pdf: Arc::new(HeadlessPdf::default()),
		}
	}

	fn record(&self, call: impl Into<String>) {
		self.calls.lock().push(call.into());
	}

	/// Every call received, oldest first.
	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().clone()
	}

	/// Takes the content half of the current link.
	///
	/// Returns `None` until the host attaches one, and after it was taken.
	pub fn take_endpoint(&self) -> Option<ContentEndpoint> {
		self.endpoint.lock().take()
	}

	pub fn is_released(&self) -> bool {
		self.released.load(Ordering::SeqCst)
	}

	/// Runs `hook` from inside [`release`](NativeContents::release).
	pub fn on_release(&self, hook: impl FnOnce() + Send + 'static) {
		*self.on_release.lock() = Some(Box::new(hook));
	}

	/// URL the pending navigation targets.
	pub fn pending_url(&self) -> Option<Url> {
		self.state.lock().pending.clone()
	}

	/// Commits the pending navigation with `title`, returning its URL.
	pub fn commit(&self, title: &str) -> Option<Url> {
		let mut state = self.state.lock();
		let url = state.pending.take()?;
		let (current, replace) = (state.index, state.replace_current);
		match current {
			Some(index) if replace => state.history[index] = url.clone(),
			_ => {
				let next = current.map_or(0, |index| index + 1);
				state.history.truncate(next);
				state.history.push(url.clone());
				state.index = Some(next);
			}
		}
		state.replace_current = false;
		state.title = title.to_string();
		Some(url)
	}

	pub fn size(&self) -> SizeParams {
		self.state.lock().size
	}

	pub fn allows_transparency(&self) -> bool {
		self.state.lock().transparent
	}

	pub fn set_service_worker(&self, registered: bool) {
		self.state.lock().service_worker = registered;
	}

	pub fn inspector_state(&self) -> &HeadlessInspector {
		&self.inspector
	}

	/// Makes the next PDF render fail with `reason`.
	pub fn fail_next_pdf(&self, reason: impl Into<String>) {
		*self.pdf.failure.lock() = Some(reason.into());
	}

	fn navigate_history(&self, offset: i32) {
		let mut state = self.state.lock();
		let Some(index) = state.index else { return };
		let target = index as i64 + i64::from(offset);
		if target < 0 || target >= state.history.len() as i64 {
			return;
		}
		state.index = Some(target as usize);
		state.pending = None;
	}
}

impl NativeContents for HeadlessContents {
	fn native_key(&self) -> NativeKey {
		self.key
	}

	fn attach_content(&self, endpoint: ContentEndpoint) {
		self.record("attach_content");
		*self.endpoint.lock() = Some(endpoint);
	}

	fn load_url(&self, url: &Url, options: &LoadUrlOptions) {
		self.record(format!("load_url {url}"));
		let mut state = self.state.lock();
		if let Some(user_agent) = &options.user_agent {
			state.user_agent = user_agent.clone();
		}
		state.pending = Some(url.clone());
		state.replace_current = false;
	}

	fn stop(&self) {
		self.record("stop");
		self.state.lock().pending = None;
	}

	fn reload(&self, ignore_cache: bool) {
		self.record(format!("reload ignore_cache={ignore_cache}"));
		let mut state = self.state.lock();
		let current = state.index.and_then(|index| state.history.get(index).cloned());
		// Nothing committed yet: retry the pending URL, if any.
		if current.is_some() {
			state.pending = current;
			state.replace_current = true;
		}
	}

	fn go_back(&self) {
		self.record("go_back");
		self.navigate_history(-1);
	}

	fn go_forward(&self) {
		self.record("go_forward");
		self.navigate_history(1);
	}

	fn go_to_offset(&self, offset: i32) {
		self.record(format!("go_to_offset {offset}"));
		self.navigate_history(offset);
	}

	fn can_go_back(&self) -> bool {
		matches!(self.state.lock().index, Some(index) if index > 0)
	}

	fn can_go_forward(&self) -> bool {
		let state = self.state.lock();
		matches!(state.index, Some(index) if index + 1 < state.history.len())
	}

	fn url(&self) -> Option<Url> {
		let state = self.state.lock();
		state.index.and_then(|index| state.history.get(index).cloned())
	}

	fn title(&self) -> String {
		self.state.lock().title.clone()
	}

	fn set_user_agent(&self, user_agent: &str) {
		self.record(format!("set_user_agent {user_agent}"));
		self.state.lock().user_agent = user_agent.to_string();
	}

	fn user_agent(&self) -> String {
		self.state.lock().user_agent.clone()
	}

	fn insert_css(&self, css: &str) {
		self.record(format!("insert_css {css}"));
	}

	fn execute_script(&self, code: &str) {
		self.record(format!("execute_script {code}"));
	}

	fn focus(&self) {
		self.record("focus");
	}

	fn tab_traverse(&self, reverse: bool) {
		self.record(format!("tab_traverse reverse={reverse}"));
	}

	fn edit(&self, command: EditCommand) {
		match &command {
			EditCommand::Replace(text) | EditCommand::ReplaceMisspelling(text) => {
				self.record(format!("edit {} {text}", command.name()))
			}
			_ => self.record(format!("edit {}", command.name())),
		}
	}

	fn set_audio_muted(&self, muted: bool) {
		self.record(format!("set_audio_muted {muted}"));
		self.state.lock().muted = muted;
	}

	fn is_audio_muted(&self) -> bool {
		self.state.lock().muted
	}

	fn print(&self, options: &PrintOptions) -> bool {
		self.record(format!("print silent={}", options.silent));
		self.url().is_some()
	}

	fn set_size(&self, params: &SizeParams) {
		self.record("set_size");
		self.state.lock().size = *params;
	}

	fn set_allow_transparency(&self, allow: bool) {
		self.record(format!("set_allow_transparency {allow}"));
		self.state.lock().transparent = allow;
	}

	fn release(&self) {
		self.record("release");
		if self.released.swap(true, Ordering::SeqCst) {
			tracing::error!(native = %self.key, "native object released twice");
			return;
		}
		self.endpoint.lock().take();
		self.release_log.lock().push(self.key);
		let hook = self.on_release.lock().take();
		if let Some(hook) = hook {
			hook();
		}
	}

	fn inspector(&self) -> Option<Arc<dyn InspectionHost>> {
		Some(Arc::clone(&self.inspector) as Arc<dyn InspectionHost>)
	}

	fn pdf_renderer(&self) -> Option<Arc<dyn PdfRenderer>> {
		*self.pdf.source.lock() = self.url();
		Some(Arc::clone(&self.pdf) as Arc<dyn PdfRenderer>)
	}

	fn has_service_worker(&self, done: Completion<bool>) {
		let registered = self.state.lock().service_worker;
		done(registered)
	}

	fn unregister_service_worker(&self, done: Completion<bool>) {
		self.record("unregister_service_worker");
		let registered = std::mem::replace(&mut self.state.lock().service_worker, false);
		done(registered)
	}
}

impl std::fmt::Debug for HeadlessContents {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HeadlessContents")
			.field("key", &self.key)
			.field("released", &self.is_released())
			.finish()
	}
}

/// Inspector state of a [`HeadlessContents`].
#[derive(Debug, Default)]
pub struct HeadlessInspector {
	opened: AtomicBool,
	inspected: Mutex<Option<(i32, i32)>>,
	workspaces: Mutex<Vec<PathBuf>>,
}

impl HeadlessInspector {
	pub fn inspected(&self) -> Option<(i32, i32)> {
		*self.inspected.lock()
	}

	pub fn workspaces(&self) -> Vec<PathBuf> {
		self.workspaces.lock().clone()
	}
}

impl InspectionHost for HeadlessInspector {
	fn open(&self, _options: &DevToolsOptions) {
		self.opened.store(true, Ordering::SeqCst);
	}

	fn close(&self) {
		self.opened.store(false, Ordering::SeqCst);
	}

	fn is_opened(&self) -> bool {
		self.opened.load(Ordering::SeqCst)
	}

	fn inspect_element(&self, x: i32, y: i32) {
		*self.inspected.lock() = Some((x, y));
	}

	fn inspect_service_worker(&self) {}

	fn add_workspace(&self, path: &Path) {
		let mut workspaces = self.workspaces.lock();
		if !workspaces.iter().any(|existing| existing == path) {
			workspaces.push(path.to_path_buf());
		}
	}

	fn remove_workspace(&self, path: &Path) {
		self.workspaces.lock().retain(|existing| existing != path);
	}
}

#[derive(Debug, Default)]
struct HeadlessPdf {
	source: Mutex<Option<Url>>,
	failure: Mutex<Option<String>>,
}

impl PdfRenderer for HeadlessPdf {
	fn print_to_pdf(&self, settings: &PdfSettings, done: Completion<std::result::Result<Vec<u8>, String>>) {
		if let Some(reason) = self.failure.lock().take() {
			return done(Err(reason));
		}
		let Some(source) = self.source.lock().clone() else {
			return done(Err("nothing to print".into()));
		};
		let orientation = if settings.landscape { "landscape" } else { "portrait" };
		let document = format!("%PDF-1.4\n% {source} {:?} {orientation}\n%%EOF\n", settings.page_size);
		done(Ok(document.into_bytes()))
	}
}

/// Factory producing [`HeadlessContents`].
#[derive(Default)]
pub struct HeadlessFactory {
	next_key: AtomicU64,
	created: Mutex<Vec<Arc<HeadlessContents>>>,
	release_log: Arc<Mutex<Vec<NativeKey>>>,
	fail_next: AtomicBool,
}

impl HeadlessFactory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Objects created through the factory, in creation order.
	pub fn created(&self) -> Vec<Arc<HeadlessContents>> {
		self.created.lock().clone()
	}

	/// Native keys in release order, across every object this factory made.
	pub fn release_order(&self) -> Vec<NativeKey> {
		self.release_log.lock().clone()
	}

	/// An engine object the host did not create, for `create_from`.
	pub fn detached(&self) -> Arc<HeadlessContents> {
		Arc::new(self.build())
	}

	/// Makes the next `create` fail.
	pub fn fail_next(&self) {
		self.fail_next.store(true, Ordering::SeqCst);
	}

	fn build(&self) -> HeadlessContents {
		let key = NativeKey(self.next_key.fetch_add(1, Ordering::SeqCst) + 1);
		HeadlessContents::new(key, Arc::clone(&self.release_log))
	}
}

impl NativeFactory for HeadlessFactory {
	fn create(&self, options: &ContentsOptions) -> Result<Arc<dyn NativeContents>> {
		if self.fail_next.swap(false, Ordering::SeqCst) {
			return Err(Error::Unsupported("engine refused to create contents".into()));
		}
		let native = Arc::new(self.build());
		if options.transparent {
			native.state.lock().transparent = true;
		}
		self.created.lock().push(Arc::clone(&native));
		Ok(native)
	}
}

/// Reports a successful main-frame load of the pending URL.
///
/// Call after [`WebContents::load_url`]. Returns the committed URL.
pub fn drive_load(contents: &WebContents, title: &str) -> Result<Url> {
	let host = contents.host()?;
	let native = contents.native_as::<HeadlessContents>()?;
	let id = contents.id();
	let url = native
		.pending_url()
		.ok_or_else(|| Error::InvalidArgument(format!("no pending navigation on {id}")))?;

	host.on_engine_signal(id, EngineSignal::DidStartLoading);
	host.on_engine_signal(id, EngineSignal::RequestSent);
	host.on_engine_signal(
		id,
		EngineSignal::ResponseStarted(ResourceResponse {
			url: url.to_string(),
			original_url: url.to_string(),
			http_response_code: 200,
			method: "GET".into(),
			referrer: String::new(),
			resource_type: "mainFrame".into(),
			headers: vec![("content-type".into(), "text/html".into())],
			status_changed: false,
		}),
	);
	native.commit(title);
	host.on_engine_signal(
		id,
		EngineSignal::DidNavigateMainFrame(NavigationDetails {
			url: url.to_string(),
			is_main_frame: true,
			is_in_page: false,
			http_status_code: Some(200),
		}),
	);
	host.on_engine_signal(
		id,
		EngineSignal::NavigationEntryCommitted {
			url: url.to_string(),
			is_in_page: false,
			did_replace_entry: false,
		},
	);
	host.on_engine_signal(
		id,
		EngineSignal::TitleWasSet {
			title: title.to_string(),
			explicit: true,
		},
	);
	host.on_engine_signal(id, EngineSignal::DocumentLoaded { is_main_frame: true });
	host.on_engine_signal(id, EngineSignal::DidFinishLoad { is_main_frame: true });
	host.on_engine_signal(id, EngineSignal::DidStopLoading);
	Ok(url)
}

/// Reports a provisional main-frame failure of the pending URL.
pub fn drive_failed_load(contents: &WebContents, code: i32, description: &str) -> Result<()> {
	let host = contents.host()?;
	let native = contents.native_as::<HeadlessContents>()?;
	let id = contents.id();
	let url = native.pending_url().map(|url| url.to_string()).unwrap_or_default();

	host.on_engine_signal(id, EngineSignal::DidStartLoading);
	host.on_engine_signal(id, EngineSignal::RequestSent);
	host.on_engine_signal(
		id,
		EngineSignal::DidFailProvisionalLoad {
			url,
			code,
			description: description.to_string(),
			is_main_frame: true,
		},
	);
	host.on_engine_signal(id, EngineSignal::DidStopLoading);
	Ok(())
}

/// Reports that the content process died.
pub fn drive_crash(contents: &WebContents, status: TerminationStatus) -> Result<()> {
	let host = contents.host()?;
	let native = contents.native_as::<HeadlessContents>()?;
	native.endpoint.lock().take();
	host.on_engine_signal(contents.id(), EngineSignal::ProcessGone(status));
	Ok(())
}

/// Runs a content-process stand-in on `endpoint`.
///
/// Requests are answered with `respond(channel, payload)`; plain messages
/// are ignored. Stops when the host drops the link.
pub fn spawn_responder<F>(mut endpoint: ContentEndpoint, respond: F) -> JoinHandle<()>
where
	F: Fn(&str, Payload) -> Payload + Send + 'static,
{
	tokio::spawn(async move {
		while let Some(message) = endpoint.recv().await {
			match message {
				HostToContent::Request {
					request_id,
					channel,
					payload,
				} => {
					let reply = respond(&channel, payload);
					if endpoint.reply(request_id, reply).is_err() {
						break;
					}
				}
				HostToContent::Message { channel, .. } => {
					tracing::trace!(id = %endpoint.instance(), %channel, "content received message");
				}
				HostToContent::Reply { .. } => {}
			}
		}
	})
}

/// Event sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct EventLog {
	events: Mutex<Vec<ContentsEvent>>,
}

impl EventLog {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn events(&self) -> Vec<ContentsEvent> {
		self.events.lock().clone()
	}

	/// Event names for `id`, in emission order.
	pub fn names_for(&self, id: tether_runtime::InstanceId) -> Vec<&'static str> {
		self.events
			.lock()
			.iter()
			.filter(|event| event.id == id)
			.map(|event| event.kind.name())
			.collect()
	}

	pub fn clear(&self) {
		self.events.lock().clear();
	}
}

impl EventSink for EventLog {
	fn on_event(&self, event: &ContentsEvent) {
		self.events.lock().push(event.clone());
	}
}
