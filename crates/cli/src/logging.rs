use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Installs the stderr subscriber.
///
/// `RUST_LOG` wins over `-v` when set.
pub fn init_logging(verbosity: u8) {
	let filter = match verbosity {
		0 => "warn,tether_runtime=error",
		1 => "info,tether_cli=debug",
		2 => "debug",
		_ => "trace",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(verbosity > 1)
		.compact()
		.init();
}
