//! Shared setup for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tether::headless::{EventLog, HeadlessContents, HeadlessFactory};
use tether::{ContentsEvent, ContentsHost, HostConfig, WebContents};
use tokio::sync::broadcast;

pub struct Fixture {
	pub host: ContentsHost,
	pub factory: Arc<HeadlessFactory>,
	pub log: Arc<EventLog>,
}

pub fn fixture() -> Fixture {
	fixture_with(HostConfig::default())
}

pub fn fixture_with(config: HostConfig) -> Fixture {
	let factory = Arc::new(HeadlessFactory::new());
	let host = ContentsHost::new(config, factory.clone());
	let log = EventLog::new();
	host.add_sink(log.clone());
	Fixture { host, factory, log }
}

pub fn engine(contents: &WebContents) -> Arc<HeadlessContents> {
	contents.native_as::<HeadlessContents>().expect("headless engine")
}

/// Waits for the next event matching `pred`.
pub async fn next_event<F>(rx: &mut broadcast::Receiver<ContentsEvent>, pred: F) -> ContentsEvent
where
	F: Fn(&ContentsEvent) -> bool,
{
	tokio::time::timeout(Duration::from_secs(5), async {
		loop {
			let event = rx.recv().await.expect("event channel open");
			if pred(&event) {
				return event;
			}
		}
	})
	.await
	.expect("event within timeout")
}
