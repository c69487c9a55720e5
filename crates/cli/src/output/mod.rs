//! Result envelope printed by every command.
//!
//! ```json
//! { "ok": true, "command": "ping", "data": { ... }, "timings": { "durationMs": 3 } }
//! ```
//!
//! Failures carry `error: { code, message }` instead of `data`.


use std::io::{self, Write};
use std::time::Instant;

use colored::Colorize;
use serde::Serialize;
use tether::Error;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty JSON
	Json,
	/// One JSON document per line
	Ndjson,
}

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	InstanceDestroyed,
	InstanceCrashed,
	NotAGuest,
	LoadFailed,
	PolicyDenied,
	Timeout,
	InvalidInput,
	InternalError,
}

impl ErrorCode {
	pub fn from_error(error: &anyhow::Error) -> Self {
		match error.downcast_ref::<Error>() {
			Some(Error::InstanceDestroyed(_) | Error::NotFound(_)) => ErrorCode::InstanceDestroyed,
			Some(Error::InstanceCrashed(_)) => ErrorCode::InstanceCrashed,
			Some(Error::NotAGuest(_)) => ErrorCode::NotAGuest,
			Some(Error::LoadFailed { .. }) => ErrorCode::LoadFailed,
			Some(Error::PolicyDenied(_)) => ErrorCode::PolicyDenied,
			Some(Error::Timeout(_)) => ErrorCode::Timeout,
			Some(Error::InvalidArgument(_) | Error::Json(_)) => ErrorCode::InvalidInput,
			Some(_) => ErrorCode::InternalError,
			None if error.downcast_ref::<serde_json::Error>().is_some() || error.downcast_ref::<io::Error>().is_some() => {
				ErrorCode::InvalidInput
			}
			None => ErrorCode::InternalError,
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = serde_json::to_value(self).ok();
		write!(f, "{}", code.as_ref().and_then(|v| v.as_str()).unwrap_or("INTERNAL_ERROR"))
	}
}

#[derive(Debug, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	pub timings: Timings,
}

/// Builds a [`CommandResult`], timing from construction to [`build`](Self::build).
pub struct ResultBuilder {
	command: String,
	started: Instant,
}

impl ResultBuilder {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			started: Instant::now(),
		}
	}

	pub fn success<T: Serialize>(self, data: T) -> CommandResult<T> {
		self.build(Some(data), None)
	}

	pub fn failure(self, error: &anyhow::Error) -> CommandResult<()> {
		let error = CommandError {
			code: ErrorCode::from_error(error),
			message: format!("{error:#}"),
		};
		self.build(None, Some(error))
	}

	fn build<T: Serialize>(self, data: Option<T>, error: Option<CommandError>) -> CommandResult<T> {
		CommandResult {
			ok: error.is_none(),
			command: self.command,
			data,
			error,
			timings: Timings {
				duration_ms: self.started.elapsed().as_millis() as u64,
			},
		}
	}
}

/// Renders a result in `format`.
pub fn render<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) -> String {
	match format {
		OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
		OutputFormat::Ndjson => serde_json::to_string(result).unwrap_or_default(),
		OutputFormat::Text => render_text(result),
	}
}

fn render_text<T: Serialize>(result: &CommandResult<T>) -> String {
	let mut out = String::new();
	match (&result.data, &result.error) {
		(_, Some(error)) => {
			out.push_str(&format!("{} {}: {}\n", "error".red().bold(), error.code, error.message));
		}
		(Some(data), None) => {
			out.push_str(&format!("{} {}\n", "ok".green().bold(), result.command));
			let value = serde_json::to_value(data).unwrap_or_default();
			write_text_value(&mut out, &value, 1);
		}
		(None, None) => out.push_str(&format!("{} {}\n", "ok".green().bold(), result.command)),
	}
	out
}

fn write_text_value(out: &mut String, value: &serde_json::Value, depth: usize) {
	let indent = "  ".repeat(depth);
	match value {
		serde_json::Value::Object(map) => {
			for (key, value) in map {
				match value {
					serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
						out.push_str(&format!("{indent}{}:\n", key.cyan()));
						write_text_value(out, value, depth + 1);
					}
					_ => out.push_str(&format!("{indent}{}: {}\n", key.cyan(), scalar(value))),
				}
			}
		}
		serde_json::Value::Array(items) => {
			for item in items {
				match item {
					serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
						out.push_str(&format!("{indent}-\n"));
						write_text_value(out, item, depth + 1);
					}
					_ => out.push_str(&format!("{indent}- {}\n", scalar(item))),
				}
			}
		}
		_ => out.push_str(&format!("{indent}{}\n", scalar(value))),
	}
}

fn scalar(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Prints a result to stdout.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	let rendered = render(result, format);
	let mut stdout = io::stdout().lock();
	let _ = stdout.write_all(rendered.as_bytes());
	if !rendered.ends_with('\n') {
		let _ = writeln!(stdout);
	}
}
