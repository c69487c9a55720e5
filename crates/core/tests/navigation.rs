mod harness;

use harness::{engine, fixture};
use tether::headless::{drive_crash, drive_failed_load, drive_load};
use tether::{ContentsOptions, EngineSignal, EventKind, LoadUrlOptions, NavigationState, TerminationStatus};

#[test]
fn successful_load_goes_idle_loading_idle() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	assert_eq!(contents.id().as_u64(), 1);
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Idle);

	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	fx.host.on_engine_signal(contents.id(), EngineSignal::DidStartLoading);
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Loading);
	assert!(contents.is_loading().unwrap());

	fx.host.on_engine_signal(contents.id(), EngineSignal::RequestSent);
	assert!(contents.is_waiting_for_response().unwrap());

	fx.host.on_engine_signal(contents.id(), EngineSignal::DidStopLoading);
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Idle);
	assert!(!contents.is_loading().unwrap());
}

#[test]
fn committed_title_is_reported() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	let url = drive_load(&contents, "Example Domain").unwrap();

	assert_eq!(contents.title().unwrap(), "Example Domain");
	assert_eq!(contents.url().unwrap(), Some(url));
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Idle);

	let names = fx.log.names_for(contents.id());
	assert_eq!(
		names,
		vec![
			"created",
			"did-start-loading",
			"did-get-response-details",
			"did-navigate",
			"navigation-entry-committed",
			"page-title-updated",
			"dom-ready",
			"did-finish-load",
			"did-stop-loading",
		]
	);
}

#[test]
fn one_stop_per_start() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	let id = contents.id();

	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	// Nested starts (subframes) do not open a second run.
	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	fx.host.on_engine_signal(id, EngineSignal::DidStopLoading);
	fx.host.on_engine_signal(id, EngineSignal::DidStopLoading);

	let names = fx.log.names_for(id);
	assert_eq!(names.iter().filter(|name| **name == "did-start-loading").count(), 1);
	assert_eq!(names.iter().filter(|name| **name == "did-stop-loading").count(), 1);
}

#[test]
fn failed_load_is_recorded_and_instance_stays_usable() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.load_url("https://unreachable.test", LoadUrlOptions::default()).unwrap();
	drive_failed_load(&contents, -105, "ERR_NAME_NOT_RESOLVED").unwrap();

	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Idle);
	let failure = contents.last_load_failure().unwrap().expect("failure recorded");
	assert_eq!(failure.code, -105);
	assert_eq!(failure.description, "ERR_NAME_NOT_RESOLVED");
	assert!(failure.provisional);
	assert!(fx.log.events().iter().any(|event| matches!(
		&event.kind,
		EventKind::DidFailLoad { failure, is_main_frame: true } if failure.url == "https://unreachable.test/"
	)));

	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	drive_load(&contents, "Recovered").unwrap();
	assert_eq!(contents.title().unwrap(), "Recovered");
	assert!(contents.last_load_failure().unwrap().is_none());
}

#[test]
fn subframe_failure_does_not_touch_main_frame_state() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	fx.host.on_engine_signal(
		contents.id(),
		EngineSignal::DidFailLoad {
			url: "https://ads.test/frame".into(),
			code: -3,
			description: "ERR_ABORTED".into(),
			is_main_frame: false,
		},
	);

	assert!(contents.last_load_failure().unwrap().is_none());
	assert_eq!(fx.log.names_for(contents.id()).last(), Some(&"did-fail-load"));
}

#[test]
fn crash_is_terminal_until_reload() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	let id = contents.id();
	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	drive_load(&contents, "Example").unwrap();

	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	drive_crash(&contents, TerminationStatus::ProcessCrashed).unwrap();
	assert!(contents.is_crashed().unwrap());
	assert!(!contents.is_loading().unwrap());

	// Stray callbacks from the dead process change nothing.
	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	fx.host.on_engine_signal(id, EngineSignal::DidStopLoading);
	assert!(contents.is_crashed().unwrap());

	contents.reload().unwrap();
	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Loading);
	fx.host.on_engine_signal(id, EngineSignal::DidStopLoading);
	assert_eq!(contents.navigation_state().unwrap(), NavigationState::Idle);

	let crashes = fx
		.log
		.events()
		.into_iter()
		.filter(|event| matches!(event.kind, EventKind::Crashed { status: TerminationStatus::ProcessCrashed }))
		.count();
	assert_eq!(crashes, 1);
	let names = fx.log.names_for(id);
	let starts = names.iter().filter(|name| **name == "did-start-loading").count();
	let stops = names.iter().filter(|name| **name == "did-stop-loading").count();
	assert_eq!((starts, stops), (3, 3));
	// A new content process gets a fresh link.
	assert!(engine(&contents).take_endpoint().is_some());
}

#[test]
fn history_navigation_passes_through() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	for (url, title) in [("https://a.test", "A"), ("https://b.test", "B")] {
		contents.load_url(url, LoadUrlOptions::default()).unwrap();
		drive_load(&contents, title).unwrap();
	}

	assert!(contents.can_go_back().unwrap());
	assert!(!contents.can_go_forward().unwrap());
	contents.go_back().unwrap();
	assert_eq!(contents.url().unwrap().unwrap().as_str(), "https://a.test/");
	assert!(contents.can_go_forward().unwrap());
	contents.go_to_offset(1).unwrap();
	assert_eq!(contents.url().unwrap().unwrap().as_str(), "https://b.test/");

	let calls = engine(&contents).calls();
	assert!(calls.contains(&"go_back".to_string()));
	assert!(calls.contains(&"go_to_offset 1".to_string()));
}

#[test]
fn invalid_url_is_rejected_before_engine() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	let err = contents.load_url("not a url", LoadUrlOptions::default()).unwrap_err();
	assert!(matches!(err, tether::Error::InvalidArgument(_)));
	assert!(engine(&contents).calls().iter().all(|call| !call.starts_with("load_url")));
}

#[test]
fn load_options_user_agent_sticks() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents
		.load_url("https://example.test", LoadUrlOptions::default().with_user_agent("probe/2.0"))
		.unwrap();
	assert_eq!(contents.user_agent().unwrap(), "probe/2.0");
}

#[test]
fn signals_for_dead_instances_are_ignored() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	let id = contents.id();
	contents.destroy();
	fx.log.clear();

	fx.host.on_engine_signal(id, EngineSignal::DidStartLoading);
	fx.host.on_engine_signal(id, EngineSignal::ProcessGone(TerminationStatus::ProcessCrashed));
	assert!(fx.log.events().is_empty());
}

#[test]
fn favicon_candidates_are_filtered() {
	use tether_protocol::{FaviconType, FaviconUrl};

	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	fx.host.on_engine_signal(
		contents.id(),
		EngineSignal::FaviconUrlsUpdated(vec![
			FaviconUrl {
				url: "https://example.test/favicon.ico".into(),
				icon_type: FaviconType::Favicon,
			},
			FaviconUrl {
				url: "https://example.test/broken".into(),
				icon_type: FaviconType::Invalid,
			},
		]),
	);

	let urls = fx.log.events().into_iter().find_map(|event| match event.kind {
		EventKind::FaviconUpdated { urls } => Some(urls),
		_ => None,
	});
	assert_eq!(urls, Some(vec!["https://example.test/favicon.ico".to_string()]));
}

#[test]
fn crash_mid_load_closes_the_run() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	fx.host.on_engine_signal(contents.id(), EngineSignal::DidStartLoading);
	fx.host.on_engine_signal(contents.id(), EngineSignal::RequestSent);

	drive_crash(&contents, TerminationStatus::OutOfMemory).unwrap();

	let names = fx.log.names_for(contents.id());
	assert_eq!(names[names.len() - 3..], ["did-start-loading", "crashed", "did-stop-loading"]);
	assert!(!contents.is_loading().unwrap());
}

#[test]
fn console_signal_becomes_event() {
	use tether::ConsoleEntry;
	use tether_protocol::ConsoleLevel;

	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	fx.host.on_engine_signal(
		contents.id(),
		EngineSignal::ConsoleMessage(ConsoleEntry {
			level: ConsoleLevel::Warning,
			message: "deprecated api".into(),
			line: 12,
			source_id: "https://example.test/app.js".into(),
		}),
	);

	let found = fx.log.events().into_iter().any(|event| {
		matches!(event.kind, EventKind::ConsoleMessage { level: ConsoleLevel::Warning, ref message, line: 12, .. } if message == "deprecated api")
	});
	assert!(found);
}
