use clap::Parser;
use colored::Colorize;
use tether_cli::{cli::Cli, commands, logging, output::OutputFormat};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	if let Err(err) = commands::dispatch(cli).await {
		// Structured formats already carry the failure envelope on stdout.
		if format == OutputFormat::Text {
			eprintln!("{} {err:#}", "error:".red().bold());
		}
		std::process::exit(1);
	}
}
