//! Notifications consumed by the component and events it emits.

use crate::models::CertificateRecord;
use crate::selection::Selection;

// =============================================================================
// Store notifications
// =============================================================================

/// A notification published by the certificate data store or the host.
///
/// `cancelable` notifications are requests still on their way to a data
/// model, which takes them over. The committed change is published again
/// as a non-cancelable notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A certificate was inserted or updated.
    CertificateUpserted {
        record: CertificateRecord,
        cancelable: bool,
    },
    /// A certificate was deleted.
    CertificateDeleted { id: String, cancelable: bool },
    /// A data store was wiped.
    DatastoreDestroyed { datastore: String },
    /// A bulk import finished; every consumer should re-query.
    DataImported,
}

impl Notification {
    /// Committed insert or update.
    pub fn upserted(record: CertificateRecord) -> Self {
        Self::CertificateUpserted {
            record,
            cancelable: false,
        }
    }

    /// Committed delete.
    pub fn deleted(id: impl Into<String>) -> Self {
        Self::CertificateDeleted {
            id: id.into(),
            cancelable: false,
        }
    }

    /// Data store wiped.
    pub fn destroyed(datastore: impl Into<String>) -> Self {
        Self::DatastoreDestroyed {
            datastore: datastore.into(),
        }
    }

    /// Event name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CertificateUpserted { .. } => "client-certificate-insert",
            Self::CertificateDeleted { .. } => "client-certificate-delete",
            Self::DatastoreDestroyed { .. } => "datastore-destroyed",
            Self::DataImported => "data-imported",
        }
    }
}

// =============================================================================
// Component events
// =============================================================================

/// Event emitted by the component to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    /// The selection changed.
    Change { selected: Option<Selection> },
    /// The certificate list changed. `len` is `None` while the list is absent.
    ItemsChanged { len: Option<usize> },
}

impl ComponentEvent {
    /// Check if this is a selection change.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Change { .. })
    }
}
