mod harness;

use std::path::PathBuf;

use harness::{engine, fixture};
use tether::headless::drive_load;
use tether::{ContentsOptions, DevToolsOptions, Error, LoadUrlOptions, PdfSettings, PrintOptions};

#[test]
fn content_calls_pass_through() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.insert_css("body { color: red }").unwrap();
	contents.execute_script("document.title").unwrap();
	contents.focus().unwrap();
	contents.tab_traverse(true).unwrap();
	contents.set_user_agent("custom/1.0").unwrap();

	assert_eq!(contents.user_agent().unwrap(), "custom/1.0");
	let calls = engine(&contents).calls();
	for expected in [
		"insert_css body { color: red }",
		"execute_script document.title",
		"focus",
		"tab_traverse reverse=true",
	] {
		assert!(calls.iter().any(|call| call == expected), "missing {expected}: {calls:?}");
	}
}

#[test]
fn editing_commands_reach_engine_in_order() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.select_all().unwrap();
	contents.copy().unwrap();
	contents.unselect().unwrap();
	contents.undo().unwrap();
	contents.redo().unwrap();
	contents.cut().unwrap();
	contents.paste().unwrap();
	contents.paste_and_match_style().unwrap();
	contents.delete().unwrap();
	contents.replace("word").unwrap();
	contents.replace_misspelling("spelling").unwrap();

	let edits: Vec<_> = engine(&contents)
		.calls()
		.into_iter()
		.filter(|call| call.starts_with("edit "))
		.collect();
	assert_eq!(
		edits,
		vec![
			"edit selectAll",
			"edit copy",
			"edit unselect",
			"edit undo",
			"edit redo",
			"edit cut",
			"edit paste",
			"edit pasteAndMatchStyle",
			"edit delete",
			"edit replace word",
			"edit replaceMisspelling spelling",
		]
	);
}

#[test]
fn audio_mute_round_trips() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	assert!(!contents.is_audio_muted().unwrap());
	contents.set_audio_muted(true).unwrap();
	assert!(contents.is_audio_muted().unwrap());
}

#[test]
fn devtools_open_close_toggle() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.open_devtools(DevToolsOptions { detach: true }).unwrap();
	contents.open_devtools(DevToolsOptions::default()).unwrap();
	assert!(contents.is_devtools_opened().unwrap());
	contents.toggle_devtools().unwrap();
	assert!(!contents.is_devtools_opened().unwrap());
	contents.inspect_element(12, 34).unwrap();
	assert!(contents.is_devtools_opened().unwrap());
	contents.close_devtools().unwrap();

	assert_eq!(engine(&contents).inspector_state().inspected(), Some((12, 34)));
	assert_eq!(
		fx.log.names_for(contents.id()),
		vec!["created", "devtools-opened", "devtools-closed", "devtools-opened", "devtools-closed"]
	);
}

#[test]
fn devtools_workspaces() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	contents.add_workspace("/srv/app").unwrap();
	contents.add_workspace("/srv/app").unwrap();
	contents.add_workspace("/srv/lib").unwrap();
	contents.remove_workspace("/srv/app").unwrap();
	contents.inspect_service_worker().unwrap();

	assert_eq!(engine(&contents).inspector_state().workspaces(), vec![PathBuf::from("/srv/lib")]);
}

#[tokio::test]
async fn service_worker_queries_are_relayed() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	assert!(!contents.has_service_worker().await.unwrap());
	engine(&contents).set_service_worker(true);
	assert!(contents.has_service_worker().await.unwrap());
	assert!(contents.unregister_service_worker().await.unwrap());
	assert!(!contents.has_service_worker().await.unwrap());
	assert!(!contents.unregister_service_worker().await.unwrap());
}

#[tokio::test]
async fn print_to_pdf_relays_the_document() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	contents.load_url("https://example.test/report", LoadUrlOptions::default()).unwrap();
	drive_load(&contents, "Report").unwrap();

	let document = contents
		.print_to_pdf(PdfSettings {
			landscape: true,
			..PdfSettings::default()
		})
		.await
		.unwrap();
	let text = String::from_utf8(document).unwrap();
	assert!(text.starts_with("%PDF-1.4"));
	assert!(text.contains("https://example.test/report"));
	assert!(text.contains("landscape"));
}

#[tokio::test]
async fn print_to_pdf_failure_is_an_error() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	let err = contents.print_to_pdf(PdfSettings::default()).await.unwrap_err();
	assert!(matches!(err, Error::PrintFailed(ref reason) if reason == "nothing to print"));

	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	drive_load(&contents, "Example").unwrap();
	engine(&contents).fail_next_pdf("printer on fire");
	let err = contents.print_to_pdf(PdfSettings::default()).await.unwrap_err();
	assert!(matches!(err, Error::PrintFailed(ref reason) if reason == "printer on fire"));
}

#[test]
fn print_needs_a_committed_page() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();
	assert!(!contents.print(PrintOptions::default()).unwrap());

	contents.load_url("https://example.test", LoadUrlOptions::default()).unwrap();
	drive_load(&contents, "Example").unwrap();
	assert!(contents.print(PrintOptions { silent: true, ..PrintOptions::default() }).unwrap());
}

#[test]
fn handles_compare_by_identity() {
	let fx = fixture();
	let a = fx.host.create(ContentsOptions::default()).unwrap();
	let b = fx.host.create(ContentsOptions::default()).unwrap();

	assert_eq!(a, fx.host.contents(a.id()).unwrap());
	assert_ne!(a, b);
	assert!(a.native_as::<tether::headless::HeadlessContents>().is_ok());
}
