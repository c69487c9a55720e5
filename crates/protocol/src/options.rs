//! Option structs for navigation, inspection and printing.

use serde::{Deserialize, Serialize};

/// Options for `loadURL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadUrlOptions {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_referrer: Option<String>,
	/// Overrides the instance user agent for this navigation and later ones.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_agent: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub extra_headers: Option<String>,
}

impl LoadUrlOptions {
	pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
		self.http_referrer = Some(referrer.into());
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}
}

/// Options for opening developer tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevToolsOptions {
	/// Open detached from the inspected surface.
	#[serde(default)]
	pub detach: bool,
}

/// Options for `print`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOptions {
	/// Skip the system print dialog.
	#[serde(default)]
	pub silent: bool,
	#[serde(default = "default_true")]
	pub print_background: bool,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			silent: false,
			print_background: true,
		}
	}
}

fn default_true() -> bool {
	true
}

/// Paper size for PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
	#[default]
	A4,
	A3,
	Legal,
	Letter,
	Tabloid,
}

/// Settings for `printToPDF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfSettings {
	/// 0 = default, 1 = none, 2 = minimum.
	#[serde(default)]
	pub margins_type: u8,
	#[serde(default)]
	pub page_size: PageSize,
	#[serde(default)]
	pub print_background: bool,
	#[serde(default)]
	pub print_selection_only: bool,
	#[serde(default)]
	pub landscape: bool,
}
