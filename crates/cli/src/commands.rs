//! Command implementations against the headless engine.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tether::headless::{self, EventLog, HeadlessContents, HeadlessFactory};
use tether::{ContentsHost, ContentsOptions, HostConfig, LoadUrlOptions, NativeContents, Payload, TerminationStatus};
use tether_protocol::HostToContent;
use tracing::{debug, info};

use crate::cli::{Cli, Commands, ContentBehavior};
use crate::output::{self, OutputFormat, ResultBuilder};

/// Runs the parsed command and prints its result.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;
	let config = load_config(cli.config.as_deref())?;
	let builder = ResultBuilder::new(cli.command.name());

	let outcome = run(cli.command, config).await;
	match outcome {
		Ok(data) => {
			output::print_result(&builder.success(data), format);
			Ok(())
		}
		Err(err) => {
			if format != OutputFormat::Text {
				output::print_result(&builder.failure(&err), format);
			}
			Err(err)
		}
	}
}

fn load_config(path: Option<&std::path::Path>) -> Result<HostConfig> {
	let Some(path) = path else {
		return Ok(HostConfig::default());
	};
	let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	let config = HostConfig::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))?;
	debug!(path = %path.display(), "loaded host config");
	Ok(config)
}

async fn run(command: Commands, config: HostConfig) -> Result<Value> {
	match command {
		Commands::Navigate {
			url,
			title,
			fail,
			user_agent,
		} => to_value(navigate(config, &url, &title, fail, user_agent).await?),
		Commands::Ping { channel, args, content } => to_value(ping(config, &channel, &args, content).await?),
		Commands::Guests { count, nested } => to_value(guests(config, count, nested)?),
		Commands::Config => to_value(config),
	}
}

fn to_value<T: Serialize>(data: T) -> Result<Value> {
	Ok(serde_json::to_value(data)?)
}

fn host(config: HostConfig) -> (ContentsHost, Arc<HeadlessFactory>, Arc<EventLog>) {
	let factory = Arc::new(HeadlessFactory::new());
	let host = ContentsHost::new(config, factory.clone());
	let log = EventLog::new();
	host.add_sink(log.clone());
	(host, factory, log)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NavigateData {
	id: u64,
	url: Option<String>,
	title: String,
	user_agent: String,
	state: String,
	failure: Option<tether::LoadFailure>,
	events: Vec<&'static str>,
}

async fn navigate(config: HostConfig, url: &str, title: &str, fail: Option<i32>, user_agent: Option<String>) -> Result<NavigateData> {
	let (host, _factory, log) = host(config);
	let contents = host.create(ContentsOptions::default())?;
	let options = LoadUrlOptions {
		user_agent,
		..LoadUrlOptions::default()
	};
	contents.load_url(url, options)?;

	match fail {
		Some(code) => headless::drive_failed_load(&contents, code, &format!("net error {code}"))?,
		None => {
			headless::drive_load(&contents, title)?;
		}
	}
	info!(id = %contents.id(), "navigation finished");

	let data = NavigateData {
		id: contents.id().as_u64(),
		url: contents.url()?.map(|url| url.to_string()),
		title: contents.title()?,
		user_agent: contents.user_agent()?,
		state: format!("{:?}", contents.navigation_state()?),
		failure: contents.last_load_failure()?,
		events: log.names_for(contents.id()),
	};
	host.shutdown();
	Ok(data)
}

#[derive(Debug, Serialize)]
struct PingData {
	channel: String,
	sent: Payload,
	reply: Payload,
}

async fn ping(config: HostConfig, channel: &str, args: &[String], content: ContentBehavior) -> Result<PingData> {
	let (host, _factory, _log) = host(config);
	let dispatcher = host.start();
	let contents = host.create(ContentsOptions::default())?;
	let native = contents.native_as::<HeadlessContents>()?;
	let mut endpoint = native
		.take_endpoint()
		.context("content link was not attached")?;
	let sent: Payload = args.iter().map(|arg| parse_arg(arg)).collect();

	match content {
		ContentBehavior::Reply => {
			headless::spawn_responder(endpoint, |_, _| vec![Value::from("pong")]);
		}
		ContentBehavior::Echo => {
			headless::spawn_responder(endpoint, |_, payload| payload);
		}
		ContentBehavior::Crash => {
			let crashing = contents.clone();
			tokio::spawn(async move {
				while let Some(message) = endpoint.recv().await {
					if matches!(message, HostToContent::Request { .. }) {
						debug!("content process crashing before reply");
						let _ = headless::drive_crash(&crashing, TerminationStatus::ProcessCrashed);
						break;
					}
				}
			});
		}
		ContentBehavior::Hang => {
			tokio::spawn(async move { while endpoint.recv().await.is_some() {} });
		}
	}

	let result = contents.send_sync(channel, sent.clone()).await;
	host.shutdown();
	let _ = dispatcher.await;
	let reply = result.with_context(|| format!("sync send on '{channel}' failed"))?;
	Ok(PingData {
		channel: channel.to_string(),
		sent,
		reply,
	})
}

fn parse_arg(arg: &str) -> Value {
	serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuestsData {
	parent: String,
	guests: Vec<String>,
	released: Vec<String>,
	alive_after: usize,
}

fn guests(config: HostConfig, count: usize, nested: bool) -> Result<GuestsData> {
	let (host, factory, _log) = host(config);
	let parent = host.create(ContentsOptions::default())?;
	let mut guests = Vec::new();
	for _ in 0..count {
		let guest = host.create(ContentsOptions::guest_of(parent.id()))?;
		if nested {
			guests.push(host.create(ContentsOptions::guest_of(guest.id()))?);
		}
		guests.push(guest);
	}
	let parent_key = parent.native_as::<HeadlessContents>()?.native_key();
	let guest_keys = guests
		.iter()
		.map(|guest| Ok(guest.native_as::<HeadlessContents>()?.native_key().to_string()))
		.collect::<Result<Vec<_>>>()?;

	parent.destroy();
	Ok(GuestsData {
		parent: parent_key.to_string(),
		guests: guest_keys,
		released: factory.release_order().iter().map(ToString::to_string).collect(),
		alive_after: host.instances().len(),
	})
}
