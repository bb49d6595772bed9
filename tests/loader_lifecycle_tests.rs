//! Loader lifecycle under concurrent triggers, failures and teardown
mod common;

use std::sync::Arc;

use common::{FlakyAssets, GatedAssets, GatedExtensions, RecordingGateway, desktop, harness, phone};
use panel_editor::editor::{Adapter, EditorAdapter, LoadOutcome, SessionState};
use panel_editor::error::EditorError;
use panel_editor::page::PageAction;
use panel_editor::widget::WidgetFamily;

#[tokio::test]
async fn test_profile_flip_during_load_ends_on_latest_profile() {
    let assets = Arc::new(GatedAssets::new());
    let h = harness(RecordingGateway::default(), assets.clone(), desktop());
    let page = &h.page;

    let flip = async {
        assets.wait_for_calls(1).await;
        page.resize(phone());
        assert_eq!(page.animation_frame().await.expect("frame"), LoadOutcome::Queued);
        assets.release(2);
    };
    let (mounted, ()) = tokio::join!(page.mount(), flip);

    assert_eq!(mounted.expect("mount"), LoadOutcome::Ready);
    let info = page.session();
    assert_eq!(info.state, SessionState::Ready);
    assert_eq!(info.family, Some(WidgetFamily::Compact));
    assert_eq!(assets.runtime_calls(), 2);

    // The full widget was mounted once and released before the compact one
    let surface = page.loader().surface();
    assert_eq!(surface.mount_count(), 2);
    assert_eq!(surface.release_count(), 1);
    assert_eq!(surface.occupant(), Some(WidgetFamily::Compact));
    assert_eq!(page.loader().keyboard().listener_count(), 1);
}

#[tokio::test]
async fn test_profile_flip_and_back_during_load_keeps_one_session() {
    let assets = Arc::new(GatedAssets::new());
    let h = harness(RecordingGateway::default(), assets.clone(), desktop());
    let page = &h.page;

    let flip = async {
        assets.wait_for_calls(1).await;
        page.resize(phone());
        page.animation_frame().await.expect("frame");
        page.resize(desktop());
        page.animation_frame().await.expect("frame");
        assets.release(1);
    };
    let (mounted, ()) = tokio::join!(page.mount(), flip);

    assert_eq!(mounted.expect("mount"), LoadOutcome::Ready);
    assert_eq!(page.loader().family(), Some(WidgetFamily::Full));
    assert_eq!(assets.runtime_calls(), 1);
    assert_eq!(page.loader().surface().mount_count(), 1);
}

#[tokio::test]
async fn test_profile_flip_queued_behind_failed_load_is_applied() {
    let assets = Arc::new(GatedAssets::new());
    assets.fail_next(1);
    let h = harness(RecordingGateway::default(), assets.clone(), desktop());
    let page = &h.page;

    let flip = async {
        assets.wait_for_calls(1).await;
        page.resize(phone());
        assert_eq!(page.animation_frame().await.expect("frame"), LoadOutcome::Queued);
        assets.release(2);
    };
    let (mounted, ()) = tokio::join!(page.mount(), flip);

    assert_eq!(mounted.expect("mount"), LoadOutcome::Ready);
    let info = page.session();
    assert_eq!(info.state, SessionState::Ready);
    assert_eq!(info.family, Some(WidgetFamily::Compact));
    assert!(info.last_error.is_none());
    assert_eq!(assets.runtime_calls(), 2);

    // The failed full load never mounted anything
    assert_eq!(page.loader().surface().mount_count(), 1);
    assert_eq!(page.loader().surface().occupant(), Some(WidgetFamily::Compact));
}

#[tokio::test]
async fn test_language_change_during_extension_fetch_rebuilds_with_matching_support() {
    let assets = Arc::new(GatedExtensions::new());
    let h = harness(
        RecordingGateway::default().with_file("notes.md", "select 1;"),
        assets.clone(),
        phone(),
    );
    let page = &h.page;
    page.open(PageAction::Edit("notes.md".to_string()))
        .await
        .expect("open");

    let switch = async {
        assets.wait_for_calls(1).await;
        let outcome = page
            .select_language(panel_editor::ContentType::new("sql"))
            .await
            .expect("select");
        assert_eq!(outcome, LoadOutcome::Queued);
        assets.release(2);
    };
    let (mounted, ()) = tokio::join!(page.mount(), switch);

    assert_eq!(mounted.expect("mount"), LoadOutcome::Ready);
    let adapter = page.loader().adapter().expect("adapter");
    assert_eq!(adapter.mode_id(), "text/x-sql");
    assert_eq!(adapter.get_value(), "select 1;");
    match adapter.as_ref() {
        Adapter::Compact(compact) => {
            let support = compact.widget().language_support().expect("support");
            assert_eq!(support.content_type, panel_editor::ContentType::new("sql"));
        }
        Adapter::Full(_) => panic!("expected the compact widget"),
    }
    assert_eq!(
        page.session().content_type,
        Some(panel_editor::ContentType::new("sql"))
    );
}

#[tokio::test]
async fn test_second_mount_while_loading_is_ignored() {
    let assets = Arc::new(GatedAssets::new());
    let h = harness(RecordingGateway::default(), assets.clone(), desktop());
    let page = &h.page;

    let second = async {
        assets.wait_for_calls(1).await;
        assert!(page.is_loading());
        let outcome = page.mount().await.expect("mount");
        assets.release(1);
        outcome
    };
    let (first, second) = tokio::join!(page.mount(), second);

    assert_eq!(first.expect("mount"), LoadOutcome::Ready);
    assert_eq!(second, LoadOutcome::AlreadyLoading);
    assert_eq!(assets.runtime_calls(), 1);
    assert_eq!(page.loader().surface().mount_count(), 1);
}

#[tokio::test]
async fn test_teardown_mid_load_installs_nothing() {
    let assets = Arc::new(GatedAssets::new());
    let h = harness(RecordingGateway::default(), assets.clone(), desktop());
    let page = &h.page;

    let unmount = async {
        assets.wait_for_calls(1).await;
        page.teardown();
        assets.release(1);
    };
    let (mounted, ()) = tokio::join!(page.mount(), unmount);

    assert_eq!(mounted.expect("mount"), LoadOutcome::Superseded);
    assert_eq!(page.loader().state(), SessionState::Disposed);
    assert!(page.loader().adapter().is_none());
    assert!(page.loader().surface().is_vacant());
    assert_eq!(page.loader().surface().mount_count(), 0);
    assert_eq!(page.loader().keyboard().listener_count(), 0);
}

#[tokio::test]
async fn test_runtime_failure_is_retryable() {
    let assets = Arc::new(FlakyAssets::offline());
    let h = harness(
        RecordingGateway::default().with_file("server.properties", "motd=hi"),
        assets.clone(),
        desktop(),
    );
    let page = &h.page;
    page.open(PageAction::Edit("server.properties".to_string()))
        .await
        .expect("open");

    let err = page.mount().await.unwrap_err();
    assert!(matches!(
        err,
        EditorError::AssetLoad {
            family: WidgetFamily::Full,
            ..
        }
    ));
    let info = page.session();
    assert_eq!(info.state, SessionState::Failed);
    assert!(info.last_error.is_some());
    assert!(!page.is_loading());
    assert!(page.loader().surface().is_vacant());

    assets.set_offline(false);
    assert_eq!(page.retry().await.expect("retry"), LoadOutcome::Ready);
    let adapter = page.loader().adapter().expect("adapter");
    assert_eq!(adapter.get_value(), "motd=hi");
    assert!(page.session().last_error.is_none());
}

#[tokio::test]
async fn test_missing_language_extension_falls_back_to_plain_highlighting() {
    let assets = Arc::new(FlakyAssets::online());
    let h = harness(
        RecordingGateway::default().with_file("notes.md", "# hi"),
        assets,
        phone(),
    );
    let page = &h.page;
    page.open(PageAction::Edit("/notes.md".to_string()))
        .await
        .expect("open");

    assert_eq!(page.mount().await.expect("mount"), LoadOutcome::Ready);
    let adapter = page.loader().adapter().expect("adapter");
    assert_eq!(adapter.mode_id(), "text/x-markdown");
    assert_eq!(adapter.get_value(), "# hi");
    match adapter.as_ref() {
        Adapter::Compact(compact) => assert!(compact.widget().language_support().is_none()),
        Adapter::Full(_) => panic!("expected the compact widget"),
    }
}

#[tokio::test]
async fn test_compact_language_change_rebuilds_with_current_text() {
    let h = harness(
        RecordingGateway::default().with_file("app.js", "let a = 1;"),
        Arc::new(panel_editor::assets::BundledAssets::default()),
        phone(),
    );
    let page = &h.page;
    page.open(PageAction::Edit("app.js".to_string()))
        .await
        .expect("open");
    page.mount().await.expect("mount");
    assert_eq!(page.loader().adapter().expect("adapter").mode_id(), "text/javascript");

    let outcome = page
        .select_language(panel_editor::ContentType::new("json"))
        .await
        .expect("select");
    assert_eq!(outcome, LoadOutcome::Ready);

    let adapter = page.loader().adapter().expect("adapter");
    assert_eq!(adapter.mode_id(), "application/json");
    assert_eq!(adapter.get_value(), "let a = 1;");
    assert_eq!(page.loader().surface().mount_count(), 2);
    assert_eq!(page.loader().keyboard().listener_count(), 1);
}
