//! Requests a content process raises that need a host decision.
//!
//! Each `request_*` method consults the current [`PolicyAuthority`] and
//! publishes what happened as an event. A denial returns `PolicyDenied`
//! and leaves the engine untouched.
//!
//! [`PolicyAuthority`]: crate::PolicyAuthority

use tether_protocol::{KeyboardEvent, LoadUrlOptions, Rect, WindowDisposition};
use tether_runtime::{Error, InstanceId, Result};
use url::Url;

use crate::contents::WebContents;
use crate::events::EventKind;
use crate::host::ContentsHost;
use crate::policy::{ConsoleEntry, NewWindowRequest, WindowDecision};

impl ContentsHost {
	/// Asks the policy whether `opener` may open a new window.
	///
	/// An allowed request creates the instance with the options the policy
	/// chose; it is not navigated.
	pub fn request_new_window(&self, opener: InstanceId, request: NewWindowRequest) -> Result<WebContents> {
		self.instance(opener)?;
		let decision = self.policy().new_window(opener, &request);
		self.emit(
			opener,
			EventKind::NewWindow {
				url: request.url.clone(),
				frame_name: request.frame_name.clone(),
				disposition: request.disposition,
				allowed: matches!(decision, WindowDecision::Allow(_)),
			},
		);

		match decision {
			WindowDecision::Deny => {
				tracing::debug!(id = %opener, url = %request.url, "new window denied");
				Err(Error::PolicyDenied(format!("new window for {}", request.url)))
			}
			WindowDecision::Allow(options) => {
				let contents = self.create(options)?;
				tracing::debug!(id = %opener, child = %contents.id(), url = %request.url, "new window allowed");
				Ok(contents)
			}
		}
	}

	/// Opens `url` on behalf of `source`.
	///
	/// `CurrentTab` navigates `source` itself and returns its handle. Every
	/// other disposition goes through [`request_new_window`](Self::request_new_window)
	/// and the new instance is navigated to `url`. An invalid `url` fails
	/// before the policy is asked.
	pub fn request_open_url(
		&self,
		source: InstanceId,
		url: &str,
		disposition: WindowDisposition,
		referrer: Option<String>,
	) -> Result<WebContents> {
		Url::parse(url).map_err(|e| Error::InvalidArgument(format!("invalid url {url:?}: {e}")))?;
		let options = LoadUrlOptions {
			http_referrer: referrer.clone(),
			..LoadUrlOptions::default()
		};

		if !disposition.opens_new_surface() {
			let contents = self.contents(source)?;
			contents.load_url(url, options)?;
			return Ok(contents);
		}

		let request = NewWindowRequest {
			referrer,
			..NewWindowRequest::new(url, disposition)
		};
		let contents = self.request_new_window(source, request)?;
		if let Err(e) = contents.load_url(url, options) {
			contents.destroy();
			return Err(e);
		}
		Ok(contents)
	}

	/// Enters or leaves fullscreen for `id`.
	///
	/// Emits `EnterFullscreen`/`LeaveFullscreen` only when the state changes.
	pub fn request_fullscreen(&self, id: InstanceId, enter: bool) -> Result<()> {
		let instance = self.instance(id)?;
		if !self.policy().fullscreen(id, enter).is_allowed() {
			return Err(Error::PolicyDenied(format!("fullscreen {} for {id}", if enter { "enter" } else { "leave" })));
		}

		let previous = instance.update_display(|display| display.fullscreen = enter);
		if previous.fullscreen != enter {
			self.emit(id, if enter { EventKind::EnterFullscreen } else { EventKind::LeaveFullscreen });
		}
		Ok(())
	}

	/// Marks the instance unresponsive. Reported only.
	pub fn report_unresponsive(&self, id: InstanceId) -> Result<()> {
		self.set_responsive(id, false)
	}

	pub fn report_responsive(&self, id: InstanceId) -> Result<()> {
		self.set_responsive(id, true)
	}

	fn set_responsive(&self, id: InstanceId, responsive: bool) -> Result<()> {
		let instance = self.instance(id)?;
		let previous = instance.update_display(|display| display.responsive = responsive);
		if previous.responsive != responsive {
			tracing::info!(%id, responsive, "responsiveness changed");
			self.emit(id, if responsive { EventKind::Responsive } else { EventKind::Unresponsive });
		}
		Ok(())
	}

	/// Whether the engine may handle `event` itself.
	pub fn request_keyboard_event(&self, id: InstanceId, event: &KeyboardEvent) -> Result<()> {
		self.instance(id)?;
		if self.policy().keyboard_event(id, event).is_allowed() {
			Ok(())
		} else {
			Err(Error::PolicyDenied(format!("keyboard event {} for {id}", event.key)))
		}
	}

	pub fn request_move(&self, id: InstanceId, bounds: Rect) -> Result<()> {
		self.instance(id)?;
		if !self.policy().move_contents(id, bounds).is_allowed() {
			return Err(Error::PolicyDenied(format!("move {id}")));
		}
		self.emit(id, EventKind::MoveRequested { bounds });
		Ok(())
	}

	/// Window-close request from the page.
	///
	/// Allowing it reports `CloseRequested`; destroying the instance is left
	/// to the embedder.
	pub fn request_close(&self, id: InstanceId) -> Result<()> {
		self.instance(id)?;
		if !self.policy().close_contents(id).is_allowed() {
			return Err(Error::PolicyDenied(format!("close {id}")));
		}
		self.emit(id, EventKind::CloseRequested);
		Ok(())
	}

	pub fn request_activate(&self, id: InstanceId) -> Result<()> {
		self.instance(id)?;
		if !self.policy().activate_contents(id).is_allowed() {
			return Err(Error::PolicyDenied(format!("activate {id}")));
		}
		self.emit(id, EventKind::ActivateRequested);
		Ok(())
	}

	pub fn is_popup_or_panel(&self, id: InstanceId) -> Result<bool> {
		self.instance(id)?;
		Ok(self.policy().is_popup_or_panel(id))
	}

	/// Reports the page's before-unload outcome and returns the final decision.
	pub fn request_before_unload(&self, id: InstanceId, proceed: bool) -> Result<bool> {
		self.instance(id)?;
		let proceed = self.policy().before_unload(id, proceed);
		self.emit(id, EventKind::BeforeUnloadFired { proceed });
		Ok(proceed)
	}

	/// Publishes a console message. Returns true if the engine's own
	/// logging should be suppressed.
	pub fn request_console_message(&self, id: InstanceId, entry: ConsoleEntry) -> Result<bool> {
		self.instance(id)?;
		let suppress = self.policy().console_message(id, &entry);
		self.emit(
			id,
			EventKind::ConsoleMessage {
				level: entry.level,
				message: entry.message,
				line: entry.line,
				source_id: entry.source_id,
			},
		);
		Ok(suppress)
	}
}
