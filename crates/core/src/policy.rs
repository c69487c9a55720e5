//! Host policy decisions for requests raised by content processes.
//!
//! A [`PolicyAuthority`] answers questions; it does not observe. Observations
//! go to [`EventSink`](crate::EventSink)s. Every method has a default, so an
//! embedder overrides only what it cares about.

use serde::{Deserialize, Serialize};
use tether_protocol::{ConsoleLevel, KeyboardEvent, Rect, WindowDisposition};
use tether_runtime::InstanceId;

use crate::config::ContentsOptions;

/// Allow or suppress a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
	#[default]
	Allow,
	Deny,
}

impl Verdict {
	pub fn is_allowed(self) -> bool {
		self == Verdict::Allow
	}

	pub fn from_bool(allowed: bool) -> Self {
		if allowed { Verdict::Allow } else { Verdict::Deny }
	}
}

/// Answer to a new-window request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
	/// Suppress creation entirely.
	Deny,
	/// Create a new instance with these options.
	Allow(ContentsOptions),
}

/// A content process asked for a new window or tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWindowRequest {
	pub url: String,
	#[serde(default)]
	pub frame_name: String,
	#[serde(default)]
	pub disposition: WindowDisposition,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub referrer: Option<String>,
}

impl NewWindowRequest {
	pub fn new(url: impl Into<String>, disposition: WindowDisposition) -> Self {
		Self {
			url: url.into(),
			frame_name: String::new(),
			disposition,
			referrer: None,
		}
	}
}

/// Console output produced by a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
	pub level: ConsoleLevel,
	pub message: String,
	pub line: u32,
	pub source_id: String,
}

/// Host-side policy consulted by [`ContentsHost`](crate::ContentsHost)'s
/// `request_*` methods.
pub trait PolicyAuthority: Send + Sync {
	/// Defaults to [`WindowDecision::Deny`].
	fn new_window(&self, _opener: InstanceId, _request: &NewWindowRequest) -> WindowDecision {
		WindowDecision::Deny
	}

	fn fullscreen(&self, _id: InstanceId, _enter: bool) -> Verdict {
		Verdict::Allow
	}

	/// Whether the engine may handle a keyboard event itself.
	fn keyboard_event(&self, _id: InstanceId, _event: &KeyboardEvent) -> Verdict {
		Verdict::Allow
	}

	fn is_popup_or_panel(&self, _id: InstanceId) -> bool {
		false
	}

	fn move_contents(&self, _id: InstanceId, _bounds: Rect) -> Verdict {
		Verdict::Allow
	}

	fn close_contents(&self, _id: InstanceId) -> Verdict {
		Verdict::Allow
	}

	fn activate_contents(&self, _id: InstanceId) -> Verdict {
		Verdict::Allow
	}

	/// Final say on whether navigation away proceeds after before-unload ran.
	fn before_unload(&self, _id: InstanceId, proceed: bool) -> bool {
		proceed
	}

	/// Returns true to suppress the engine's own console logging.
	fn console_message(&self, _id: InstanceId, _entry: &ConsoleEntry) -> bool {
		false
	}
}

/// Allows display requests, denies new windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl PolicyAuthority for DefaultPolicy {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_policy_denies_new_windows() {
		let request = NewWindowRequest::new("https://popup.test", WindowDisposition::NewPopup);
		assert_eq!(DefaultPolicy.new_window(InstanceId::from_raw(1), &request), WindowDecision::Deny);
		assert!(DefaultPolicy.fullscreen(InstanceId::from_raw(1), true).is_allowed());
		assert!(!DefaultPolicy.before_unload(InstanceId::from_raw(1), false));
	}

	#[test]
	fn request_from_minimal_json() {
		let request: NewWindowRequest = serde_json::from_str(r#"{"url": "https://a.test"}"#).unwrap();
		assert_eq!(request.disposition, WindowDisposition::CurrentTab);
		assert!(request.frame_name.is_empty());
	}
}
