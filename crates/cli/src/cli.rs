use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Cargo-like help colors.
fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Drive tracked content instances against the headless engine")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Host configuration file (JSON)
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Load a URL and report the navigation events
	#[command(alias = "nav")]
	Navigate {
		/// URL to load
		url: String,

		/// Title the page commits with
		#[arg(long, default_value = "Untitled")]
		title: String,

		/// Fail the load with this network error code instead of committing
		#[arg(long, value_name = "CODE", allow_hyphen_values = true)]
		fail: Option<i32>,

		/// User agent for this navigation
		#[arg(long)]
		user_agent: Option<String>,
	},

	/// Send a synchronous message and print the reply
	Ping {
		/// Channel name
		#[arg(long, default_value = "ping")]
		channel: String,

		/// JSON arguments (each parsed as a value; plain words become strings)
		args: Vec<String>,

		/// What the content process does with the request
		#[arg(long, value_enum, default_value = "reply")]
		content: ContentBehavior,
	},

	/// Embed guests in a parent, destroy the parent, report teardown order
	Guests {
		/// Number of guests to embed
		#[arg(default_value_t = 2)]
		count: usize,

		/// Also embed one guest inside each guest
		#[arg(long)]
		nested: bool,
	},

	/// Print the effective host configuration
	Config,
}

/// Content-process behavior for `ping`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ContentBehavior {
	/// Answer with ["pong"]
	#[default]
	Reply,
	/// Echo the arguments back
	Echo,
	/// Crash before answering
	Crash,
	/// Never answer (pair with a reply timeout)
	Hang,
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Navigate { .. } => "navigate",
			Commands::Ping { .. } => "ping",
			Commands::Guests { .. } => "guests",
			Commands::Config => "config",
		}
	}
}
