//! End-to-end controller lifecycle against a fake task page.

mod util;

use std::sync::Arc;
use std::time::Duration;

use bettercodex::{
    FilterConfig, FilterController, FilterMsg, FilterStorage, MemoryStorage, Scheduler,
};
use util::{FakePage, FakeRow, LogCapture};

const KEY: &str = "bettercodex_selected_repo";

fn page() -> FakePage {
    let mut page = FakePage::with_repositories(&["acme/widgets", "acme/gadgets", "tools/cli"]);
    page.push_rows(&["acme/widgets", "acme/gadgets", "tools/cli"]);
    page.rows.push(FakeRow::unlabeled());
    page
}

fn controller_with(page: FakePage, storage: Arc<dyn FilterStorage>) -> FilterController<FakePage> {
    FilterController::new(FilterConfig::default(), page, storage)
}

/// Start at `/` and run the scheduler past both lifecycle delays.
fn booted(page: FakePage, storage: Arc<dyn FilterStorage>) -> FilterController<FakePage> {
    let mut controller = controller_with(page, storage);
    let mut scheduler = Scheduler::new();
    scheduler.push(controller.start("/"));
    scheduler.advance(&mut controller, Duration::from_millis(1500));
    controller
}

#[test]
fn lifecycle_restores_saved_filter_and_watches_rows() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let storage = Arc::new(MemoryStorage::new().with_slot(KEY, r#"["acme/widgets"]"#));
    let mut controller = controller_with(page(), storage.clone());
    let mut scheduler = Scheduler::new();
    scheduler.push(controller.start("/"));

    assert_eq!(scheduler.advance(&mut controller, Duration::from_millis(999)), 0);
    assert!(!controller.is_active());

    assert_eq!(scheduler.advance(&mut controller, Duration::from_millis(1)), 1);
    assert!(controller.is_active());
    assert_eq!(controller.host().visibility(), vec![true, false, false, true]);
    assert_eq!(controller.host().live_row_observers(), 0);

    assert_eq!(scheduler.advance(&mut controller, Duration::from_millis(500)), 1);
    assert_eq!(controller.host().live_row_observers(), 1);
    assert_eq!(scheduler.pending(), 0);

    controller.host_mut().push_rows(&["acme/widgets", "new/repo"]);
    controller.update(FilterMsg::RowsChanged);
    assert_eq!(
        controller.host().visible_repositories(),
        vec!["acme/widgets", "acme/widgets"]
    );
    let session = controller.session().expect("session");
    assert!(session.catalog().contains("new/repo"));

    // Restore writes back the current format.
    assert_eq!(storage.raw(KEY).as_deref(), Some(r#"["acme/widgets"]"#));
    logs.assert_logged("filter ready");
    logs.assert_logged("watching task list");
}

#[test]
fn selector_headers_and_actions_stay_out_of_the_catalog() {
    let controller = booted(page(), Arc::new(MemoryStorage::new()));
    let session = controller.session().expect("session");
    let entries: Vec<&str> = session.catalog().iter().collect();
    assert_eq!(entries, vec!["acme/gadgets", "acme/widgets", "tools/cli"]);
}

#[test]
fn legacy_bare_string_is_restored() {
    let storage = Arc::new(MemoryStorage::new().with_slot(KEY, "tools/cli"));
    let controller = booted(page(), storage.clone());
    assert_eq!(controller.view().terms, vec!["tools/cli"]);
    assert_eq!(controller.host().visibility(), vec![false, false, true, true]);
    assert_eq!(storage.raw(KEY).as_deref(), Some(r#"["tools/cli"]"#));
}

#[test]
fn malformed_saved_state_shows_everything() {
    let storage = Arc::new(MemoryStorage::new().with_slot(KEY, "{not json"));
    let controller = booted(page(), storage);
    assert!(controller.view().terms.is_empty());
    assert!(controller.host().visibility().iter().all(|visible| *visible));
}

#[test]
fn stale_init_from_previous_route_is_ignored() {
    let mut controller = controller_with(page(), Arc::new(MemoryStorage::new()));
    controller.start("/");
    let stale = controller.generation();
    controller.update(FilterMsg::Navigated("/tasks/42".into()));
    assert_ne!(controller.generation(), stale);

    controller.update(FilterMsg::InitDue { generation: stale });
    assert!(!controller.is_active());
    assert_eq!(controller.host().mounts, 0);

    controller.update(FilterMsg::AttachObserverDue { generation: stale });
    assert_eq!(controller.host().live_row_observers(), 0);

    let current = controller.generation();
    controller.update(FilterMsg::InitDue { generation: current });
    assert!(controller.is_active());
    assert_eq!(controller.host().mounts, 1);
}

#[test]
fn missing_toolbar_is_retried_on_same_route_navigation() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let mut page = page();
    page.toolbar_present = false;
    let mut controller = booted(page, Arc::new(MemoryStorage::new()));

    assert!(!controller.is_active());
    assert_eq!(controller.host().live_row_observers(), 0);
    logs.assert_logged("filter controls not mounted");

    // Input before init is dropped.
    controller.update(FilterMsg::TermSubmitted("acme/widgets".into()));
    assert!(controller.host().visibility().iter().all(|visible| *visible));

    controller.host_mut().toolbar_present = true;
    let failed_generation = controller.generation();
    let mut scheduler = Scheduler::new();
    scheduler.push(controller.update(FilterMsg::Navigated("/".into())));
    assert_eq!(scheduler.pending(), 2);
    assert_eq!(controller.generation(), failed_generation + 1);
    logs.assert_logged("retrying init");
    scheduler.advance(&mut controller, Duration::from_millis(1500));
    assert!(controller.is_active());
    assert_eq!(controller.host().mounts, 1);
    assert_eq!(controller.host().live_row_observers(), 1);

    // Once running, the same route is ignored again.
    assert!(controller.update(FilterMsg::Navigated("/".into())).is_none());
}

#[test]
fn missing_task_list_keeps_filter_without_observer() {
    let mut page = page();
    page.list_present = false;
    let controller = booted(page, Arc::new(MemoryStorage::new()));
    assert!(controller.is_active());
    assert!(!controller.session().expect("session").is_observing());
}

#[test]
fn navigation_tears_down_and_rebuilds_session() {
    let mut controller = booted(page(), Arc::new(MemoryStorage::new()));
    controller.update(FilterMsg::TermSubmitted("acme/gadgets".into()));
    assert_eq!(controller.host().live_row_observers(), 1);

    assert!(controller.update(FilterMsg::Navigated("/".into())).is_none());
    assert!(controller.is_active());

    let mut scheduler = Scheduler::new();
    scheduler.push(controller.update(FilterMsg::Navigated("/archive".into())));
    assert!(!controller.is_active());
    assert_eq!(controller.host().live_row_observers(), 0);

    scheduler.advance(&mut controller, Duration::from_millis(1500));
    assert!(controller.is_active());
    assert_eq!(controller.host().mounts, 2);
    assert_eq!(controller.host().live_row_observers(), 1);
    // The selection survives through storage.
    assert_eq!(controller.view().terms, vec!["acme/gadgets"]);
}

#[test]
fn api_payload_before_init_is_seeded_at_init() {
    let mut controller = controller_with(page(), Arc::new(MemoryStorage::new()));
    let mut scheduler = Scheduler::new();
    scheduler.push(controller.start("/"));

    controller.update(FilterMsg::RepositoriesFetched(
        r#"{"repositories":[{"repository_full_name":"acme/api-only","name":"api-only"},{"name":"manage-tool"},{}]}"#.into(),
    ));
    controller.update(FilterMsg::RepositoriesFetched("<html>".into()));
    scheduler.advance(&mut controller, Duration::from_millis(1000));

    let catalog = controller.session().expect("session").catalog();
    assert!(catalog.contains("acme/api-only"));
    assert!(catalog.contains("manage-tool"));
    assert!(!catalog.contains("api-only"));
    assert_eq!(catalog.len(), 5);
}

#[test]
fn api_payload_after_init_extends_open_suggestions() {
    let mut controller = booted(page(), Arc::new(MemoryStorage::new()));
    controller.update(FilterMsg::InputChanged("acme".into()));
    assert_eq!(controller.view().suggestions, vec!["acme/gadgets", "acme/widgets"]);

    controller.update(FilterMsg::RepositoriesFetched(
        r#"{"repositories":[{"repository_full_name":"acme/api"}]}"#.into(),
    ));
    assert_eq!(
        controller.view().suggestions,
        vec!["acme/api", "acme/gadgets", "acme/widgets"]
    );

    let known = controller.view().known_repositories;
    controller.update(FilterMsg::RepositoriesFetched("{truncated".into()));
    assert_eq!(controller.view().known_repositories, known);
}

#[test]
fn discovered_rows_appear_in_open_suggestions() {
    let mut controller = booted(page(), Arc::new(MemoryStorage::new()));
    controller.update(FilterMsg::InputFocused);
    assert_eq!(controller.view().suggestions.len(), 3);

    controller.host_mut().rows.push(FakeRow {
        labels: vec!["now".into(), "zeta/new".into()],
        visible: false,
    });
    controller.update(FilterMsg::RowsChanged);

    let view = controller.view();
    assert!(view.suggestions_open);
    assert_eq!(view.suggestions.last().map(String::as_str), Some("zeta/new"));
    // Discovery without an active filter leaves visibility alone.
    assert_eq!(controller.host().rows.last().map(|row| row.visible), Some(false));
}

#[test]
fn typed_terms_resolve_against_the_catalog() {
    let mut controller = booted(page(), Arc::new(MemoryStorage::new()));

    controller.update(FilterMsg::TermSubmitted("WIDG".into()));
    assert_eq!(controller.view().terms, vec!["acme/widgets"]);

    controller.update(FilterMsg::TermSubmitted("*/cli".into()));
    assert_eq!(controller.view().terms, vec!["acme/widgets", "*/cli"]);
    assert_eq!(controller.host().visibility(), vec![true, false, true, true]);

    controller.update(FilterMsg::TermSubmitted("acme/WIDGETS".into()));
    assert_eq!(controller.view().terms.len(), 2);

    controller.update(FilterMsg::TermRemoved("ACME/widgets".into()));
    assert_eq!(controller.view().terms, vec!["*/cli"]);
    assert_eq!(controller.host().visibility(), vec![false, false, true, true]);
    assert_eq!(controller.view().summary.as_deref(), Some("*/cli"));
}

#[test]
fn storage_write_failure_keeps_filtering() {
    let logs = LogCapture::new();
    let _guard = logs.install();

    let mut controller = booted(page(), Arc::new(MemoryStorage::with_quota(4)));
    controller.update(FilterMsg::TermSubmitted("tools/cli".into()));

    assert_eq!(controller.host().visibility(), vec![false, false, true, true]);
    assert_eq!(controller.view().terms, vec!["tools/cli"]);
    logs.assert_logged("failed to persist filter");
}

#[test]
fn shutdown_releases_every_subscription() {
    let mut controller = booted(page(), Arc::new(MemoryStorage::new()));
    assert_eq!(controller.host().live_navigation_observers(), 1);
    assert_eq!(controller.host().live_row_observers(), 1);

    controller.shutdown();
    assert!(!controller.is_active());
    assert_eq!(controller.host().live_navigation_observers(), 0);
    assert_eq!(controller.host().live_row_observers(), 0);
}
