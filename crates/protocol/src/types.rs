//! Detail types carried by engine callbacks and delegate requests.

use serde::{Deserialize, Serialize};

/// How a content process went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
	/// Zero exit status.
	NormalTermination,
	/// Non-zero exit status.
	AbnormalTermination,
	/// Killed by a signal or the task manager.
	ProcessWasKilled,
	/// Segmentation fault or similar.
	ProcessCrashed,
	/// Ran out of memory.
	OutOfMemory,
	/// Process failed to launch.
	LaunchFailed,
}

impl TerminationStatus {
	/// Returns true when the process ended on its own terms.
	pub fn is_clean(self) -> bool {
		matches!(self, Self::NormalTermination)
	}
}

/// Width/height pair in device-independent pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
	pub width: u32,
	pub height: u32,
}

impl Size {
	pub const fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}
}

/// Rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

/// Sizing parameters for a guest embedding.
///
/// Unset fields leave the corresponding value unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeParams {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub enable_auto_size: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub min_size: Option<Size>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_size: Option<Size>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub normal_size: Option<Size>,
}

impl SizeParams {
	/// Fixed-size parameters with auto-size disabled.
	pub fn fixed(size: Size) -> Self {
		Self {
			enable_auto_size: Some(false),
			normal_size: Some(size),
			..Self::default()
		}
	}

	/// Overlays the fields set in `other` onto `self`.
	pub fn merge(&mut self, other: &SizeParams) {
		if other.enable_auto_size.is_some() {
			self.enable_auto_size = other.enable_auto_size;
		}
		if other.min_size.is_some() {
			self.min_size = other.min_size;
		}
		if other.max_size.is_some() {
			self.max_size = other.max_size;
		}
		if other.normal_size.is_some() {
			self.normal_size = other.normal_size;
		}
	}

	/// Returns true when min/max bounds are present and min exceeds max.
	pub fn has_inverted_bounds(&self) -> bool {
		match (self.min_size, self.max_size) {
			(Some(min), Some(max)) => min.width > max.width || min.height > max.height,
			_ => false,
		}
	}
}

/// Favicon candidate advertised by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaviconUrl {
	pub url: String,
	pub icon_type: FaviconType,
}

/// Declared favicon kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaviconType {
	Favicon,
	TouchIcon,
	TouchPrecomposedIcon,
	Invalid,
}

/// First bytes of a resource response were received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
	pub url: String,
	pub original_url: String,
	pub http_response_code: u16,
	pub method: String,
	pub referrer: String,
	pub resource_type: String,
	#[serde(default)]
	pub headers: Vec<(String, String)>,
	#[serde(default)]
	pub status_changed: bool,
}

/// A resource request was redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRedirect {
	pub old_url: String,
	pub new_url: String,
	pub is_main_frame: bool,
	pub http_response_code: u16,
	pub method: String,
	pub referrer: String,
	#[serde(default)]
	pub headers: Vec<(String, String)>,
}

/// A navigation committed in the main frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDetails {
	pub url: String,
	pub is_main_frame: bool,
	/// Same-document (fragment / history API) navigation.
	pub is_in_page: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_status_code: Option<u16>,
}

/// Where a content process asked for a URL to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowDisposition {
	#[default]
	CurrentTab,
	NewForegroundTab,
	NewBackgroundTab,
	NewPopup,
	NewWindow,
	OffTheRecord,
	Other,
}

impl WindowDisposition {
	/// Returns true when the request targets a surface other than the requester.
	pub fn opens_new_surface(self) -> bool {
		!matches!(self, Self::CurrentTab)
	}
}

/// Keyboard event forwarded from a content process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardEvent {
	pub kind: KeyEventKind,
	pub key: String,
	pub code: String,
	#[serde(default)]
	pub modifiers: Vec<String>,
}

/// Keyboard event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEventKind {
	RawKeyDown,
	KeyDown,
	KeyUp,
	Char,
}

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
	Debug,
	Info,
	Warning,
	Error,
}

/// Editing command applied to the focused frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "text", rename_all = "snake_case")]
pub enum EditCommand {
	Undo,
	Redo,
	Cut,
	Copy,
	Paste,
	PasteAndMatchStyle,
	Delete,
	SelectAll,
	Unselect,
	Replace(String),
	ReplaceMisspelling(String),
}

impl EditCommand {
	/// Command name as it appears in logs.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Undo => "undo",
			Self::Redo => "redo",
			Self::Cut => "cut",
			Self::Copy => "copy",
			Self::Paste => "paste",
			Self::PasteAndMatchStyle => "pasteAndMatchStyle",
			Self::Delete => "delete",
			Self::SelectAll => "selectAll",
			Self::Unselect => "unselect",
			Self::Replace(_) => "replace",
			Self::ReplaceMisspelling(_) => "replaceMisspelling",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn size_params_merge_only_overrides_set_fields() {
		let mut current = SizeParams::fixed(Size::new(800, 600));
		current.merge(&SizeParams {
			min_size: Some(Size::new(100, 100)),
			..SizeParams::default()
		});

		assert_eq!(current.enable_auto_size, Some(false));
		assert_eq!(current.normal_size, Some(Size::new(800, 600)));
		assert_eq!(current.min_size, Some(Size::new(100, 100)));
	}

	#[test]
	fn inverted_bounds_detected() {
		let params = SizeParams {
			min_size: Some(Size::new(500, 10)),
			max_size: Some(Size::new(400, 400)),
			..SizeParams::default()
		};
		assert!(params.has_inverted_bounds());
		assert!(!SizeParams::default().has_inverted_bounds());
	}

	#[test]
	fn disposition_kebab_case() {
		let value = serde_json::to_value(WindowDisposition::NewForegroundTab).unwrap();
		assert_eq!(value, "new-foreground-tab");
		assert!(WindowDisposition::NewPopup.opens_new_surface());
		assert!(!WindowDisposition::CurrentTab.opens_new_surface());
	}

	#[test]
	fn edit_command_carries_text() {
		let value = serde_json::to_value(EditCommand::Replace("word".into())).unwrap();
		assert_eq!(value["command"], "replace");
		assert_eq!(value["text"], "word");
	}
}
