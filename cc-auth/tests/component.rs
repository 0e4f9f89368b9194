//! Tests for the client certificate authorization form.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use cc_auth::prelude::*;
use chrono::Utc;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

fn certificates(size: usize) -> Vec<CertificateRecord> {
    (0..size)
        .map(|index| {
            CertificateRecord::new(format!("{index}_"), format!("Certificate {index}"), Utc::now())
        })
        .collect()
}

async fn active_with(
    records: Vec<CertificateRecord>,
    config: MethodConfig,
) -> (CcAuthorizationMethod, NotificationBus) {
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(MemorySource::with_records(records), config);
    method.activate(&bus);
    method.settle().await;
    (method, bus)
}

fn drain_changes(rx: &mut mpsc::UnboundedReceiver<ComponentEvent>) -> Vec<Option<Selection>> {
    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ComponentEvent::Change { selected } = event {
            changes.push(selected);
        }
    }
    changes
}

fn ids(method: &CcAuthorizationMethod) -> Vec<String> {
    method
        .items()
        .unwrap_or_default()
        .iter()
        .map(|item| item.id.clone())
        .collect()
}

/// Source whose queries resolve only when the test says so.
struct GatedSource {
    gates: Mutex<VecDeque<oneshot::Receiver<Vec<CertificateRecord>>>>,
}

#[async_trait]
impl CertificateSource for GatedSource {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        let gate = self.gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.map_err(|_| SourceError::Closed),
            None => Ok(Vec::new()),
        }
    }
}

struct FailingSource;

struct PanickingSource;

#[async_trait]
impl CertificateSource for PanickingSource {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        panic!("certificate model crashed");
    }
}

#[async_trait]
impl CertificateSource for FailingSource {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        Err(SourceError::Unavailable("model not attached".to_string()))
    }
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_has_no_initial_selection() {
    let method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    assert!(method.selected().is_none());
    assert!(method.list_state().is_uninitialized());
    assert!(!method.is_active());
}

#[test]
fn test_type_is_client_certificate() {
    let method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    assert_eq!(method.method_type(), "client certificate");
    assert_eq!(method.method_type(), METHOD_CC);
}

#[test]
fn test_validate_always_true() {
    let mut method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    assert!(method.validate());
    method.restore(CcSettings::with_id("whatever"));
    assert!(method.validate());
}

#[tokio::test]
async fn test_queries_certificates_when_activated() {
    let bus = NotificationBus::new();
    let mut method =
        CcAuthorizationMethod::new(MemorySource::with_records(certificates(3)), MethodConfig::new());

    method.activate(&bus);
    assert!(method.list_state().is_pending());
    assert!(!method.has_items());

    method.settle().await;
    assert_eq!(method.items().map(<[_]>::len), Some(3));
    assert_eq!(bus.subscriber_count(), 1);
}

// =============================================================================
// Empty state and failures
// =============================================================================

#[tokio::test]
async fn test_renders_empty_state() {
    let (method, _bus) = active_with(Vec::new(), MethodConfig::new()).await;
    assert!(method.list_state().is_loaded());
    assert!(!method.has_items());
    assert_eq!(
        method.render(),
        vec!["There are no certificates installed in this application.".to_string()]
    );
}

#[tokio::test]
async fn test_failed_query_leaves_list_absent() {
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(FailingSource, MethodConfig::new());
    method.activate(&bus);
    method.settle().await;

    assert!(method.list_state().is_uninitialized());
    assert!(!method.has_items());
    assert!(method.view().is_empty());
}

#[tokio::test]
async fn test_panicking_query_counts_as_failed() {
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(PanickingSource, MethodConfig::new());
    method.activate(&bus);
    method.settle().await;

    assert!(method.list_state().is_uninitialized());
    assert!(!method.has_items());
}

#[test]
fn test_reset_without_runtime_is_absorbed() {
    let mut method =
        CcAuthorizationMethod::new(MemorySource::with_records(certificates(2)), MethodConfig::new());
    method.reset();
    assert_eq!(method.process_pending(), 1);
    assert!(method.list_state().is_uninitialized());
}

// =============================================================================
// Data list
// =============================================================================

#[tokio::test]
async fn test_lists_items_with_none_entry() {
    let (method, _bus) = active_with(certificates(15), MethodConfig::new().with_none(true)).await;
    assert_eq!(method.items().map(<[_]>::len), Some(15));
    assert_eq!(method.view().entries().len(), 16);
    assert!(method.view().entries()[0].is_none_entry());
}

#[tokio::test]
async fn test_view_follows_selected() {
    let (mut method, _bus) = active_with(certificates(3), MethodConfig::new()).await;
    method.set_selected(Some(Selection::certificate("1_")));

    let view = method.view();
    assert_eq!(view.selected_row(), Some(1));
    assert!(view.entries()[1].selected);
}

// =============================================================================
// datastore-destroyed
// =============================================================================

#[tokio::test]
async fn test_destroyed_certificates_store_clears_list_and_selection() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    method.set_selected(Some(Selection::certificate("2_")));

    bus.publish(Notification::destroyed("client-certificates"));
    method.process_pending();

    assert!(method.items().is_none());
    assert!(method.selected().is_none());
    assert!(!method.has_items());
}

#[tokio::test]
async fn test_ignores_other_data_stores() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    method.set_selected(Some(Selection::certificate("2_")));

    bus.publish(Notification::destroyed("saved-requests"));
    method.process_pending();

    assert_eq!(method.items().map(<[_]>::len), Some(5));
    assert_eq!(method.selected_id(), Some("2_"));
}

// =============================================================================
// data-imported
// =============================================================================

#[tokio::test]
async fn test_data_imported_queries_again() {
    let source = std::sync::Arc::new(MemorySource::new());
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(source.clone(), MethodConfig::new());
    method.activate(&bus);
    method.settle().await;
    assert!(!method.has_items());

    source.set_records(certificates(4));
    bus.publish(Notification::DataImported);
    method.process_pending();
    assert!(method.list_state().is_pending());

    method.settle().await;
    assert_eq!(method.items().map(<[_]>::len), Some(4));
}

// =============================================================================
// client-certificate-delete
// =============================================================================

#[tokio::test]
async fn test_delete_removes_existing_item() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    let id = method.items().unwrap()[0].id.clone();

    bus.publish(Notification::deleted(id.clone()));
    method.process_pending();

    assert_eq!(method.items().map(<[_]>::len), Some(4));
    assert!(!ids(&method).contains(&id));
}

#[tokio::test]
async fn test_delete_ignores_cancelable_event() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    let id = method.items().unwrap()[0].id.clone();

    bus.publish(Notification::CertificateDeleted {
        id,
        cancelable: true,
    });
    method.process_pending();

    assert_eq!(method.items().map(<[_]>::len), Some(5));
}

#[tokio::test]
async fn test_delete_ignores_unknown_id() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    bus.publish(Notification::deleted("some-id"));
    method.process_pending();
    assert_eq!(method.items().map(<[_]>::len), Some(5));
}

#[tokio::test]
async fn test_delete_of_selected_clears_selection() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    method.set_selected(Some(Selection::certificate("0_")));
    let mut changes = method.subscribe_changes();

    bus.publish(Notification::deleted("0_"));
    method.process_pending();

    assert!(method.selected().is_none());
    assert_eq!(drain_changes(&mut changes), vec![None]);
}

#[tokio::test]
async fn test_delete_of_restored_unlisted_selection_clears_it() {
    let (mut method, bus) = active_with(certificates(2), MethodConfig::new()).await;
    method.restore(CcSettings::with_id("x"));
    let mut changes = method.subscribe_changes();

    bus.publish(Notification::deleted("x"));
    method.process_pending();

    assert!(method.selected().is_none());
    assert_eq!(drain_changes(&mut changes), vec![None]);
    assert_eq!(method.items().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_delete_of_other_keeps_selection() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    method.set_selected(Some(Selection::certificate("0_")));

    bus.publish(Notification::deleted("1_"));
    method.process_pending();

    assert_eq!(method.selected_id(), Some("0_"));
}

// =============================================================================
// client-certificate-insert
// =============================================================================

#[tokio::test]
async fn test_insert_updates_existing_item() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    let updated = method.items().unwrap()[0].renamed("test");

    bus.publish(Notification::upserted(updated));
    method.process_pending();

    assert_eq!(method.items().unwrap()[0].name, "test");
    assert_eq!(method.items().map(<[_]>::len), Some(5));
}

#[tokio::test]
async fn test_insert_ignores_cancelable_event() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    let updated = method.items().unwrap()[0].renamed("test");

    bus.publish(Notification::CertificateUpserted {
        record: updated,
        cancelable: true,
    });
    method.process_pending();

    assert_ne!(method.items().unwrap()[0].name, "test");
}

#[tokio::test]
async fn test_insert_adds_new_item() {
    let (mut method, bus) = active_with(certificates(5), MethodConfig::new()).await;
    let record = CertificateRecord::new("6_", "New certificate", Utc::now());

    bus.publish(Notification::upserted(record));
    method.process_pending();

    assert_eq!(method.items().map(<[_]>::len), Some(6));
    assert_eq!(ids(&method).last().map(String::as_str), Some("6_"));
}

#[tokio::test]
async fn test_insert_into_empty_list() {
    let (mut method, bus) = active_with(Vec::new(), MethodConfig::new()).await;
    let record = CertificateRecord::new("a", "Only one", Utc::now());

    bus.publish(Notification::upserted(record.clone()));
    method.process_pending();

    assert!(method.has_items());
    assert_eq!(method.items(), Some(&[record][..]));
}

// =============================================================================
// Selecting an item
// =============================================================================

#[tokio::test]
async fn test_changes_selection_on_row_click() {
    let (mut method, _bus) = active_with(certificates(5), MethodConfig::new().with_none(true)).await;
    let row_id = method.view().entries()[1].id.clone();

    assert!(method.select_row(1));
    assert_ne!(method.selected_id(), Some("none"));
    assert_eq!(method.selected_id(), Some(row_id.as_str()));
}

#[tokio::test]
async fn test_notifies_change_when_selection_is_made() {
    let (mut method, _bus) = active_with(certificates(5), MethodConfig::new()).await;
    let mut changes = method.subscribe_changes();

    method.select_row(1);
    assert_eq!(drain_changes(&mut changes), vec![Some(Selection::certificate("1_"))]);

    // Clicking the checked entry again is not a change.
    assert!(!method.select_row(1));
    assert!(drain_changes(&mut changes).is_empty());
}

#[tokio::test]
async fn test_selecting_none_entry() {
    let (mut method, _bus) = active_with(certificates(2), MethodConfig::new().with_none(true)).await;
    method.select_row(0);
    assert_eq!(method.selected(), Some(&Selection::NoCertificate));
    assert_eq!(method.serialize(), CcSettings::empty());
}

#[tokio::test]
async fn test_navigation_wraps_and_notifies() {
    let (mut method, _bus) = active_with(certificates(3), MethodConfig::new()).await;
    let mut changes = method.subscribe_changes();

    assert!(method.navigate(Navigation::Up));
    assert_eq!(method.selected_id(), Some("2_"));
    assert!(method.navigate(Navigation::Down));
    assert_eq!(method.selected_id(), Some("0_"));
    assert!(!method.navigate(Navigation::First));
    assert!(method.navigate(Navigation::Last));

    assert_eq!(drain_changes(&mut changes).len(), 3);
}

#[tokio::test]
async fn test_navigation_on_empty_list() {
    let (mut method, _bus) = active_with(Vec::new(), MethodConfig::new()).await;
    assert!(!method.navigate(Navigation::Down));
    assert!(method.selected().is_none());
}

// =============================================================================
// Restoring settings
// =============================================================================

#[tokio::test]
async fn test_restore_sets_selected() {
    let (mut method, _bus) = active_with(Vec::new(), MethodConfig::new()).await;
    method.restore(CcSettings::with_id("test"));
    assert_eq!(method.selected_id(), Some("test"));
}

#[tokio::test]
async fn test_restore_without_argument_clears() {
    let (mut method, _bus) = active_with(Vec::new(), MethodConfig::new()).await;
    method.restore(CcSettings::with_id("test"));
    method.restore_value(None);
    assert!(method.selected().is_none());
}

#[test]
fn test_restore_tolerates_malformed_values() {
    let mut method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    for value in [json!(null), json!(42), json!("id"), json!({"id": 7}), json!({})] {
        method.restore(CcSettings::with_id("previous"));
        method.restore_value(Some(&value));
        assert!(method.selected().is_none(), "value {value} should clear selection");
    }
}

#[test]
fn test_restore_does_not_notify() {
    let mut method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    let mut changes = method.subscribe_changes();
    method.restore(CcSettings::with_id("a"));
    assert!(drain_changes(&mut changes).is_empty());
}

#[test]
fn test_restore_serialize_round_trip() {
    let mut method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
    for id in ["a", "3_", "0f1c9a2e-cert"] {
        method.restore(CcSettings::with_id(id));
        assert_eq!(method.serialize(), CcSettings::with_id(id));
    }
    method.restore_value(Some(&json!({})));
    assert_eq!(method.serialize(), CcSettings::empty());
}

// =============================================================================
// serialize()
// =============================================================================

#[tokio::test]
async fn test_serialize_without_selection() {
    let (method, _bus) = active_with(certificates(5), MethodConfig::new()).await;
    assert_eq!(method.serialize(), CcSettings::empty());
    assert_eq!(method.serialize().to_json().unwrap(), "{}");
}

#[tokio::test]
async fn test_serialize_none_sentinel() {
    let (mut method, _bus) = active_with(certificates(5), MethodConfig::new()).await;
    method.set_selected(Some(Selection::NoCertificate));
    assert_eq!(method.serialize(), CcSettings::empty());
}

#[tokio::test]
async fn test_serialize_then_reset_to_empty_store() {
    let source = std::sync::Arc::new(MemorySource::with_records(certificates(5)));
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(source.clone(), MethodConfig::new());
    method.activate(&bus);
    method.settle().await;

    method.select_row(3);
    assert_eq!(method.serialize().to_json().unwrap(), r#"{"id":"3_"}"#);

    source.set_records(Vec::new());
    method.reset();
    assert!(method.selected().is_none());

    method.settle().await;
    assert!(method.selected().is_none());
    assert!(!method.has_items());
}

// =============================================================================
// Query ordering
// =============================================================================

#[tokio::test]
async fn test_stale_query_result_is_discarded() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let source = GatedSource {
        gates: Mutex::new(VecDeque::from([first_rx, second_rx])),
    };
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(source, MethodConfig::new());

    method.activate(&bus);
    tokio::task::yield_now().await;
    method.reset();
    tokio::task::yield_now().await;

    second_tx
        .send(vec![CertificateRecord::new("new", "Newer", Utc::now())])
        .unwrap();
    method.settle().await;
    assert_eq!(ids(&method), vec!["new".to_string()]);

    first_tx
        .send(vec![CertificateRecord::new("old", "Older", Utc::now())])
        .unwrap();
    assert!(method.next_input().await);
    assert_eq!(ids(&method), vec!["new".to_string()]);
}

#[tokio::test]
async fn test_insert_during_query_keeps_query_result() {
    let (gate_tx, gate_rx) = oneshot::channel();
    let source = GatedSource {
        gates: Mutex::new(VecDeque::from([gate_rx])),
    };
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(source, MethodConfig::new());
    method.activate(&bus);
    tokio::task::yield_now().await;

    bus.publish(Notification::upserted(CertificateRecord::new("new", "New", Utc::now())));
    method.process_pending();
    assert!(method.list_state().is_pending());

    gate_tx.send(certificates(5)).unwrap();
    assert!(method.next_input().await);

    assert_eq!(method.items().map(<[_]>::len), Some(5));
    assert!(!ids(&method).contains(&"new".to_string()));
}

#[tokio::test]
async fn test_delete_during_query_clears_selection_only() {
    let (gate_tx, gate_rx) = oneshot::channel();
    let source = GatedSource {
        gates: Mutex::new(VecDeque::from([gate_rx])),
    };
    let bus = NotificationBus::new();
    let mut method = CcAuthorizationMethod::new(source, MethodConfig::new());
    method.activate(&bus);
    method.restore(CcSettings::with_id("1_"));

    bus.publish(Notification::deleted("1_"));
    method.process_pending();
    assert!(method.selected().is_none());

    gate_tx.send(certificates(3)).unwrap();
    method.settle().await;
    assert_eq!(method.items().map(<[_]>::len), Some(3));
}

#[tokio::test]
async fn test_insert_after_store_destroyed_is_ignored() {
    let (mut method, bus) = active_with(certificates(2), MethodConfig::new()).await;

    bus.publish(Notification::destroyed(CERTIFICATES_DATASTORE));
    bus.publish(Notification::upserted(CertificateRecord::new("a", "A", Utc::now())));
    method.process_pending();

    assert!(method.list_state().is_uninitialized());
    assert!(!method.has_items());
}

#[tokio::test]
async fn test_notifications_apply_in_order() {
    let (mut method, bus) = active_with(Vec::new(), MethodConfig::new()).await;
    let record = CertificateRecord::new("a", "A", Utc::now());

    bus.publish(Notification::upserted(record.clone()));
    bus.publish(Notification::deleted("a"));
    bus.publish(Notification::upserted(record.renamed("A2")));
    assert_eq!(method.process_pending(), 3);

    assert_eq!(method.items().unwrap()[0].name, "A2");
    assert_eq!(method.items().map(<[_]>::len), Some(1));
}

// =============================================================================
// Deactivation
// =============================================================================

#[tokio::test]
async fn test_deactivate_stops_notifications() {
    let (mut method, bus) = active_with(certificates(2), MethodConfig::new()).await;
    method.deactivate();
    assert_eq!(bus.subscriber_count(), 0);

    bus.publish(Notification::deleted("0_"));
    assert_eq!(method.process_pending(), 0);
    assert_eq!(method.items().map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_next_input_reports_closed_bus() {
    let (mut method, bus) = active_with(certificates(1), MethodConfig::new()).await;
    drop(bus);
    assert!(!method.next_input().await);
    assert!(!method.is_active());
}
