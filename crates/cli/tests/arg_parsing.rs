//! Argument parsing and end-to-end runs of the `tether` binary.

use std::process::Command;

use clap::Parser;
use serde_json::Value;
use tether_cli::cli::{Cli, Commands, ContentBehavior};
use tether_cli::output::OutputFormat;

fn run_json(args: &[&str]) -> (bool, Value) {
	let output = Command::new(env!("CARGO_BIN_EXE_tether"))
		.args(["-f", "json"])
		.args(args)
		.output()
		.expect("failed to execute tether");
	let stdout = String::from_utf8_lossy(&output.stdout);
	let value = serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {stdout}"));
	(output.status.success(), value)
}

#[test]
fn navigate_alias_and_flags() {
	let cli = Cli::try_parse_from(["tether", "-vv", "nav", "https://a.test", "--fail", "-105"]).unwrap();
	assert_eq!(cli.verbose, 2);
	assert_eq!(cli.format, OutputFormat::Text);
	match cli.command {
		Commands::Navigate { url, title, fail, .. } => {
			assert_eq!(url, "https://a.test");
			assert_eq!(title, "Untitled");
			assert_eq!(fail, Some(-105));
		}
		other => panic!("unexpected command {other:?}"),
	}
}

#[test]
fn ping_collects_args() {
	let cli = Cli::try_parse_from(["tether", "ping", "--content", "echo", "1", "two", "-f", "ndjson"]).unwrap();
	assert_eq!(cli.format, OutputFormat::Ndjson);
	match cli.command {
		Commands::Ping { channel, args, content } => {
			assert_eq!(channel, "ping");
			assert_eq!(args, vec!["1", "two"]);
			assert_eq!(content, ContentBehavior::Echo);
		}
		other => panic!("unexpected command {other:?}"),
	}
}

#[test]
fn unknown_behavior_rejected() {
	assert!(Cli::try_parse_from(["tether", "ping", "--content", "explode"]).is_err());
}

#[test]
fn navigate_reports_committed_page() {
	let (ok, value) = run_json(&["navigate", "https://example.test/", "--title", "Example"]);
	assert!(ok);
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "navigate");
	assert_eq!(value["data"]["title"], "Example");
	assert_eq!(value["data"]["url"], "https://example.test/");
}

#[test]
fn crashed_ping_fails_with_code() {
	let (ok, value) = run_json(&["ping", "--content", "crash"]);
	assert!(!ok);
	assert_eq!(value["ok"], false);
	assert_eq!(value["error"]["code"], "INSTANCE_CRASHED");
}

#[test]
fn guests_release_parent_last() {
	let (ok, value) = run_json(&["guests", "3"]);
	assert!(ok);
	let released = value["data"]["released"].as_array().unwrap();
	assert_eq!(released.len(), 4);
	assert_eq!(released.last(), Some(&value["data"]["parent"]));
}
