//! The client certificate authorization method form.
//!
//! # Example
//!
//! ```ignore
//! let bus = NotificationBus::new();
//! let mut method = CcAuthorizationMethod::new(store, MethodConfig::new().with_none(true));
//! let mut changes = method.subscribe_changes();
//!
//! method.activate(&bus);
//! method.settle().await;
//!
//! method.select_row(1);
//! let settings = method.serialize(); // {"id": "..."}
//! ```

use std::fmt;
use std::sync::Arc;

use log::{debug, trace, warn};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::bus::{NotificationBus, Subscription};
use crate::config::MethodConfig;
use crate::error::SourceError;
use crate::event::{ComponentEvent, Notification};
use crate::list::{CertificateList, FetchApplied, ListState, Upsert};
use crate::method::AuthorizationMethod;
use crate::models::{CERTIFICATES_DATASTORE, CertificateRecord, METHOD_CC};
use crate::selection::{Selection, SelectionState};
use crate::settings::CcSettings;
use crate::source::CertificateSource;
use crate::view::{FormView, Navigation, RenderOptions, render_text};

/// Result of a fetch, tagged with the sequence number it was issued under.
#[derive(Debug)]
struct FetchOutcome {
    seq: u64,
    result: Result<Vec<CertificateRecord>, SourceError>,
}

/// Input waiting to be applied.
enum Input {
    Fetched(FetchOutcome),
    Notification(Notification),
}

/// Form that lets the user pick a stored client certificate.
///
/// The form owns its selection and a copy of the certificate list. The list
/// is fetched from a [`CertificateSource`] on activation and on [`reset`],
/// and kept in sync with store notifications received from a
/// [`NotificationBus`]. Inputs are applied by the host through
/// [`process_pending`], [`next_input`] or [`settle`], in arrival order.
///
/// The type tag is read only. There is no way to assign it:
///
/// ```compile_fail
/// use cc_auth::prelude::*;
///
/// let mut method = CcAuthorizationMethod::new(MemorySource::new(), MethodConfig::new());
/// method.method_type = "basic";
/// ```
///
/// [`reset`]: CcAuthorizationMethod::reset
/// [`process_pending`]: CcAuthorizationMethod::process_pending
/// [`next_input`]: CcAuthorizationMethod::next_input
/// [`settle`]: CcAuthorizationMethod::settle
pub struct CcAuthorizationMethod {
    config: MethodConfig,
    selection: SelectionState,
    list: CertificateList,
    source: Arc<dyn CertificateSource>,
    subscription: Option<Subscription>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    listeners: Vec<mpsc::UnboundedSender<ComponentEvent>>,
}

impl CcAuthorizationMethod {
    /// Create an inactive form reading certificates from `source`.
    pub fn new(source: impl CertificateSource + 'static, config: MethodConfig) -> Self {
        Self::with_source(Arc::new(source), config)
    }

    /// Create an inactive form sharing an existing source.
    pub fn with_source(source: Arc<dyn CertificateSource>, config: MethodConfig) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        Self {
            config,
            selection: SelectionState::new(),
            list: CertificateList::new(),
            source,
            subscription: None,
            fetch_tx,
            fetch_rx,
            listeners: Vec::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Subscribe to store notifications and query the certificate list.
    pub fn activate(&mut self, bus: &NotificationBus) {
        debug!("CcAuthorizationMethod: activating");
        self.subscription = Some(bus.subscribe());
        self.reset();
    }

    /// Stop receiving store notifications.
    pub fn deactivate(&mut self) {
        if self.subscription.take().is_some() {
            debug!("CcAuthorizationMethod: deactivated");
        }
    }

    /// Check if the form is subscribed to store notifications.
    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drop the list and the selection, and query the list again.
    ///
    /// The query runs on the current tokio runtime. Its result is applied by
    /// the next [`process_pending`](Self::process_pending), unless another
    /// reset was issued in the meantime. A query task that panics counts as
    /// a failed query.
    pub fn reset(&mut self) {
        self.clear_selection();
        let seq = self.list.begin_fetch();
        debug!("CcAuthorizationMethod: querying certificates (seq {})", seq);
        self.emit_items_changed();

        let source = Arc::clone(&self.source);
        let tx = self.fetch_tx.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let query = handle.spawn(async move { source.list_certificates().await });
                handle.spawn(async move {
                    let result = query.await.unwrap_or_else(|err| {
                        Err(SourceError::Unavailable(format!(
                            "certificate query aborted: {}",
                            err
                        )))
                    });
                    let _ = tx.send(FetchOutcome { seq, result });
                });
            }
            Err(_) => {
                let _ = tx.send(FetchOutcome {
                    seq,
                    result: Err(SourceError::Unavailable("no async runtime".to_string())),
                });
            }
        }
    }

    // =========================================================================
    // Input processing
    // =========================================================================

    /// Apply every queued fetch result, then every queued notification.
    ///
    /// Returns the number of inputs applied.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(outcome) = self.fetch_rx.try_recv() {
            self.apply_fetch(outcome);
            processed += 1;
        }
        while let Some(notification) = self.next_queued_notification() {
            self.handle_notification(notification);
            processed += 1;
        }
        processed
    }

    /// Wait for the next fetch result or notification and apply it.
    ///
    /// Fetch results take priority. Returns `false` if the bus went away
    /// while waiting; the form is then deactivated.
    pub async fn next_input(&mut self) -> bool {
        let input = match self.subscription.as_mut() {
            Some(subscription) => tokio::select! {
                biased;
                Some(outcome) = self.fetch_rx.recv() => Some(Input::Fetched(outcome)),
                notification = subscription.recv() => notification.map(Input::Notification),
            },
            None => self.fetch_rx.recv().await.map(Input::Fetched),
        };

        match input {
            Some(Input::Fetched(outcome)) => self.apply_fetch(outcome),
            Some(Input::Notification(notification)) => self.handle_notification(notification),
            None => {
                debug!("CcAuthorizationMethod: notification bus closed");
                self.subscription = None;
                return false;
            }
        }
        true
    }

    /// Wait for the query in flight, if any, then apply everything queued.
    pub async fn settle(&mut self) {
        loop {
            while self.list.state().is_pending() {
                match self.fetch_rx.recv().await {
                    Some(outcome) => self.apply_fetch(outcome),
                    None => return,
                }
            }
            if self.process_pending() == 0 && !self.list.state().is_pending() {
                return;
            }
        }
    }

    /// Route a store notification to its handler.
    pub fn handle_notification(&mut self, notification: Notification) {
        trace!("CcAuthorizationMethod: received {}", notification.name());
        match notification {
            Notification::CertificateUpserted { record, cancelable } => {
                self.on_insert_or_update(record, cancelable)
            }
            Notification::CertificateDeleted { id, cancelable } => self.on_delete(&id, cancelable),
            Notification::DatastoreDestroyed { datastore } => {
                self.on_datastore_destroyed(&datastore)
            }
            Notification::DataImported => self.on_bulk_import(),
        }
    }

    /// A certificate was inserted or updated in the store.
    pub fn on_insert_or_update(&mut self, record: CertificateRecord, cancelable: bool) {
        if cancelable {
            trace!("CcAuthorizationMethod: ignoring cancelable insert of {}", record.id);
            return;
        }
        let id = record.id.clone();
        match self.list.upsert(record) {
            Upsert::Updated(index) => debug!("CcAuthorizationMethod: updated {} at {}", id, index),
            Upsert::Appended(index) => debug!("CcAuthorizationMethod: added {} at {}", id, index),
            Upsert::Ignored => {
                trace!("CcAuthorizationMethod: list not loaded, ignoring insert of {}", id);
                return;
            }
        }
        self.emit_items_changed();
    }

    /// A certificate was deleted from the store.
    pub fn on_delete(&mut self, id: &str, cancelable: bool) {
        if cancelable {
            trace!("CcAuthorizationMethod: ignoring cancelable delete of {}", id);
            return;
        }
        if self.selection.clear_certificate(id) {
            self.emit_change();
        }
        if self.list.remove(id).is_none() {
            trace!("CcAuthorizationMethod: deleted certificate {} is not listed", id);
            return;
        }
        debug!("CcAuthorizationMethod: removed {}", id);
        self.emit_items_changed();
    }

    /// A data store was destroyed. Only the certificates store is relevant.
    pub fn on_datastore_destroyed(&mut self, datastore: &str) {
        if datastore != CERTIFICATES_DATASTORE {
            trace!("CcAuthorizationMethod: ignoring destroyed store {}", datastore);
            return;
        }
        debug!("CcAuthorizationMethod: certificates store destroyed");
        self.list.clear();
        self.clear_selection();
        self.emit_items_changed();
    }

    /// A bulk import finished.
    pub fn on_bulk_import(&mut self) {
        self.reset();
    }

    fn next_queued_notification(&mut self) -> Option<Notification> {
        self.subscription.as_mut()?.try_recv()
    }

    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { seq, result } = outcome;
        if let Err(err) = &result {
            warn!("CcAuthorizationMethod: certificate query {} failed: {}", seq, err);
        }
        match self.list.complete_fetch(seq, result) {
            FetchApplied::Loaded(len) => {
                debug!("CcAuthorizationMethod: loaded {} certificate(s) (seq {})", len, seq);
                self.emit_items_changed();
            }
            FetchApplied::Failed => self.emit_items_changed(),
            FetchApplied::Stale => {
                debug!("CcAuthorizationMethod: discarding stale query result (seq {})", seq)
            }
        }
    }

    // =========================================================================
    // List
    // =========================================================================

    /// Get the list load state.
    pub fn list_state(&self) -> &ListState {
        self.list.state()
    }

    /// Get the certificates, if loaded.
    pub fn items(&self) -> Option<&[CertificateRecord]> {
        self.list.items()
    }

    /// Check if there are certificates to choose from.
    pub fn has_items(&self) -> bool {
        self.list.has_items()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Get the current selection.
    pub fn selected(&self) -> Option<&Selection> {
        self.selection.get()
    }

    /// Get the selected id; `"none"` for the "none" entry.
    pub fn selected_id(&self) -> Option<&str> {
        self.selection.id()
    }

    /// Set the selection and notify change listeners.
    pub fn set_selected(&mut self, selection: Option<Selection>) {
        self.selection.set(selection);
        self.emit_change();
    }

    /// Restore the selection from an arbitrary settings value.
    ///
    /// A missing value, a non-object, or an object without a string `id`
    /// clears the selection.
    pub fn restore_value(&mut self, value: Option<&Value>) {
        let settings = value.map(CcSettings::from_value).unwrap_or_default();
        self.restore(settings);
    }

    fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.emit_change();
        }
    }

    // =========================================================================
    // View and interaction
    // =========================================================================

    /// Get the configuration.
    pub fn config(&self) -> &MethodConfig {
        &self.config
    }

    /// Offer or hide the "none" entry.
    pub fn set_none(&mut self, none: bool) {
        self.config.none = none;
    }

    /// Toggle the compatibility style.
    pub fn set_compatibility(&mut self, compatibility: bool) {
        self.config.compatibility = compatibility;
    }

    /// Toggle the outlined style.
    pub fn set_outlined(&mut self, outlined: bool) {
        self.config.outlined = outlined;
    }

    /// Derive what the form shows.
    pub fn view(&self) -> FormView {
        FormView::derive(&self.list, &self.selection, &self.config)
    }

    /// Render the form as text lines.
    pub fn render(&self) -> Vec<String> {
        render_text(&self.view(), &RenderOptions::default())
    }

    /// Select the entry at a view row, as a click would.
    ///
    /// Returns `true` when the selection changed.
    pub fn select_row(&mut self, row: usize) -> bool {
        let view = self.view();
        let Some(entry) = view.entries().get(row) else {
            return false;
        };
        let selection = if entry.is_none_entry() {
            Selection::NoCertificate
        } else {
            Selection::certificate(entry.id.clone())
        };
        if !self.selection.set(Some(selection)) {
            return false;
        }
        self.emit_change();
        true
    }

    /// Move the selection, as the arrow keys would.
    ///
    /// Returns `true` when the selection changed.
    pub fn navigate(&mut self, navigation: Navigation) -> bool {
        let view = self.view();
        match navigation.target(view.selected_row(), view.entries().len()) {
            Some(row) => self.select_row(row),
            None => false,
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Receive [`ComponentEvent`]s emitted from now on.
    pub fn subscribe_changes(&mut self) -> mpsc::UnboundedReceiver<ComponentEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.push(tx);
        rx
    }

    fn emit_change(&mut self) {
        let selected = self.selection.get().cloned();
        self.emit(ComponentEvent::Change { selected });
    }

    fn emit_items_changed(&mut self) {
        let len = self.list.items().map(<[_]>::len);
        self.emit(ComponentEvent::ItemsChanged { len });
    }

    fn emit(&mut self, event: ComponentEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl AuthorizationMethod for CcAuthorizationMethod {
    type Settings = CcSettings;

    fn method_type(&self) -> &'static str {
        METHOD_CC
    }

    /// Always valid: picking a certificate is optional.
    fn validate(&self) -> bool {
        true
    }

    fn serialize(&self) -> CcSettings {
        self.selection.serialize()
    }

    /// Restore the selection. Does not notify change listeners.
    fn restore(&mut self, settings: CcSettings) {
        self.selection.restore(settings);
    }
}

impl fmt::Debug for CcAuthorizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CcAuthorizationMethod")
            .field("config", &self.config)
            .field("selection", &self.selection)
            .field("list", &self.list)
            .field("active", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}
