//! Document round trips and shortcuts through the editor page
mod common;

use std::sync::Arc;

use common::{RecordingGateway, desktop, harness, phone};
use panel_editor::assets::BundledAssets;
use panel_editor::editor::{Adapter, EditorAdapter, LoadOutcome};
use panel_editor::error::EditorError;
use panel_editor::host::FILES_VIEW_FLASH_KEY;
use panel_editor::keyboard::KeyEvent;
use panel_editor::language::ContentType;
use panel_editor::page::PageAction;
use panel_editor::persistence::PersistenceError;
use panel_editor::widget::{ChangeOrigin, TextEdit};

/// Simulate the user typing at the end of the document
fn type_text(adapter: &Adapter, text: &str) {
    let edit = TextEdit::insert(adapter.get_value().len(), text);
    match adapter {
        Adapter::Full(full) => full.widget().execute_edits(&[edit]),
        Adapter::Compact(compact) => compact.widget().apply_edits(ChangeOrigin::Input, &[edit]),
    }
}

#[tokio::test]
async fn test_save_sends_editor_text_without_leading_slash() {
    let h = harness(
        RecordingGateway::default().with_file("app.js", "hello"),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page
        .open(PageAction::Edit("/app.js".to_string()))
        .await
        .expect("open");
    h.page.mount().await.expect("mount");

    h.page.save_clicked().await.expect("save");
    assert_eq!(h.gateway.saves(), vec![("app.js".to_string(), "hello".to_string())]);
    assert!(h.flash.errors().is_empty());
    assert!(!h.page.is_loading());
    assert!(!h.page.content().is_dirty());
}

#[tokio::test]
async fn test_save_records_unreported_editor_text_in_document() {
    let h = harness(
        RecordingGateway::default().with_file("app.js", "hello"),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page
        .open(PageAction::Edit("app.js".to_string()))
        .await
        .expect("open");
    h.page.mount().await.expect("mount");

    // set_value does not echo back into the document
    let adapter = h.page.loader().adapter().expect("adapter");
    adapter.set_value("changed");
    assert_eq!(h.page.document().content, "hello");

    h.page.save_clicked().await.expect("save");
    assert_eq!(h.gateway.saves(), vec![("app.js".to_string(), "changed".to_string())]);
    assert_eq!(h.page.document().content, "changed");
    assert!(!h.page.content().is_dirty());
}

#[tokio::test]
async fn test_failed_save_flashes_once_and_keeps_text() {
    let h = harness(
        RecordingGateway::default().with_file("app.js", "hello"),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page
        .open(PageAction::Edit("/app.js".to_string()))
        .await
        .expect("open");
    h.page.mount().await.expect("mount");
    h.gateway
        .fail_saves_with(PersistenceError::Network("connection reset".to_string()));

    let err = h.page.save_clicked().await.unwrap_err();
    assert!(matches!(err, EditorError::SaveFailure(PersistenceError::Network(_))));

    let errors = h.flash.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, FILES_VIEW_FLASH_KEY);
    assert!(!h.page.is_loading());

    let adapter = h.page.loader().adapter().expect("adapter");
    assert_eq!(adapter.get_value(), "hello");
    assert_eq!(h.page.document().content, "hello");
}

#[tokio::test]
async fn test_missing_file_flashes_and_clears_loading() {
    let h = harness(
        RecordingGateway::default(),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    let err = h
        .page
        .open(PageAction::Edit("/gone.txt".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, EditorError::LoadFailure(PersistenceError::NotFound(_))));
    assert_eq!(h.flash.errors().len(), 1);
    assert!(!h.page.is_loading());
}

#[tokio::test]
async fn test_create_new_file_saves_and_navigates() {
    let h = harness(
        RecordingGateway::default(),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page.open(PageAction::New).await.expect("open");
    h.page.mount().await.expect("mount");

    let adapter = h.page.loader().adapter().expect("adapter");
    assert_eq!(adapter.get_value(), "");
    type_text(&adapter, "# Notes");
    assert_eq!(h.page.document().content, "# Notes");

    // Unnamed files ask for a name instead of saving
    h.page.save_clicked().await.expect("save");
    assert_eq!(h.location.prompts(), 1);
    assert!(h.gateway.saves().is_empty());

    h.page.file_named("notes.md").await.expect("save as");
    assert_eq!(h.gateway.saves(), vec![("notes.md".to_string(), "# Notes".to_string())]);

    let document = h.page.document();
    assert_eq!(document.path, "/notes.md");
    assert_eq!(document.language, ContentType::new("markdown"));
    assert!(!document.is_new);
    assert_eq!(
        h.location.url().as_deref(),
        Some("/server/srv-1/files/edit#/notes.md")
    );
    assert_eq!(h.location.directory().as_deref(), Some("/"));
    assert_eq!(h.page.loader().adapter().expect("adapter").mode_id(), "markdown");
}

#[tokio::test]
async fn test_save_as_encodes_nested_path_in_url() {
    let h = harness(
        RecordingGateway::default(),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page.open(PageAction::New).await.expect("open");
    h.page.mount().await.expect("mount");

    h.page
        .file_named("plugins/my config.yml")
        .await
        .expect("save as");
    assert_eq!(
        h.location.url().as_deref(),
        Some("/server/srv-1/files/edit#/plugins/my%20config.yml")
    );
    assert_eq!(h.location.directory().as_deref(), Some("/plugins"));
}

#[tokio::test]
async fn test_contents_reach_editor_mounted_before_or_after_load() {
    // Mounted first: the live session gets the text through set_value
    let before = harness(
        RecordingGateway::default().with_file("ops.yml", "a: 1"),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    before.page.mount().await.expect("mount");
    before
        .page
        .open(PageAction::Edit("ops.yml".to_string()))
        .await
        .expect("open");
    let adapter = before.page.loader().adapter().expect("adapter");
    assert_eq!(adapter.get_value(), "a: 1");
    assert_eq!(adapter.mode_id(), "yaml");
    assert!(!before.page.content().is_dirty());

    // Loaded first: the text becomes the initial value of the session
    let after = harness(
        RecordingGateway::default().with_file("ops.yml", "a: 1"),
        Arc::new(BundledAssets::default()),
        phone(),
    );
    let (opened, mounted) = tokio::join!(
        after.page.open(PageAction::Edit("ops.yml".to_string())),
        after.page.mount()
    );
    opened.expect("open");
    assert_eq!(mounted.expect("mount"), LoadOutcome::Ready);
    let adapter = after.page.loader().adapter().expect("adapter");
    assert_eq!(adapter.get_value(), "a: 1");
    assert_eq!(adapter.mode_id(), "text/x-yaml");
}

#[tokio::test]
async fn test_ctrl_s_saves_existing_file() {
    let h = harness(
        RecordingGateway::default().with_file("app.js", "hello"),
        Arc::new(BundledAssets::default()),
        phone(),
    );
    h.page
        .open(PageAction::Edit("app.js".to_string()))
        .await
        .expect("open");
    h.page.mount().await.expect("mount");
    type_text(&h.page.loader().adapter().expect("adapter"), " world");

    let mut event = KeyEvent::parse("ctrl+s").expect("chord");
    h.page.handle_key(&mut event).await.expect("key");

    assert!(event.default_prevented());
    assert_eq!(
        h.gateway.saves(),
        vec![("app.js".to_string(), "hello world".to_string())]
    );
}

#[tokio::test]
async fn test_cmd_s_on_new_file_prompts_for_name() {
    let h = harness(
        RecordingGateway::default(),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page.open(PageAction::New).await.expect("open");
    h.page.mount().await.expect("mount");

    let mut event = KeyEvent::new("s").with_meta();
    h.page.handle_key(&mut event).await.expect("key");

    assert!(event.default_prevented());
    assert_eq!(h.location.prompts(), 1);
    assert!(h.gateway.saves().is_empty());
}

#[tokio::test]
async fn test_other_keys_pass_through() {
    let h = harness(
        RecordingGateway::default(),
        Arc::new(BundledAssets::default()),
        desktop(),
    );
    h.page.mount().await.expect("mount");

    let mut event = KeyEvent::new("s");
    h.page.handle_key(&mut event).await.expect("key");
    assert!(!event.default_prevented());

    h.page.teardown();
    let mut event = KeyEvent::new("s").with_ctrl();
    h.page.handle_key(&mut event).await.expect("key");
    assert!(!event.default_prevented());
    assert_eq!(h.location.prompts(), 0);
}
