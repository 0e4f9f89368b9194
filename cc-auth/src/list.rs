//! The certificate list and its load state.

use crate::error::SourceError;
use crate::models::CertificateRecord;

/// Load state of the certificate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListState {
    /// Not queried, or cleared.
    #[default]
    Uninitialized,
    /// A fetch tagged with `seq` is in flight.
    Pending { seq: u64 },
    /// Fetched. May be empty.
    Loaded(Vec<CertificateRecord>),
}

impl ListState {
    /// Check if no list has been fetched.
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    /// Check if a fetch is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Check if the list is available.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Get the loaded records.
    pub fn as_loaded(&self) -> Option<&[CertificateRecord]> {
        match self {
            Self::Loaded(items) => Some(items),
            _ => None,
        }
    }
}

/// Outcome of applying a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    /// The list now holds this many records.
    Loaded(usize),
    /// The fetch failed; the list stays absent.
    Failed,
    /// A newer fetch was issued, or the list was cleared, after this one.
    Stale,
}

/// Outcome of an insert-or-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// Replaced the record at this position.
    Updated(usize),
    /// Appended at this position.
    Appended(usize),
    /// The list is not loaded; the record was not applied.
    Ignored,
}

/// Ordered list of certificates, reconciled against store notifications.
///
/// Every fetch is tagged with a monotonically increasing sequence number.
/// Only the result of the most recently issued fetch is applied.
#[derive(Debug, Clone, Default)]
pub struct CertificateList {
    state: ListState,
    seq: u64,
}

impl CertificateList {
    /// Create an uninitialized list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the load state.
    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Get the records, if loaded.
    pub fn items(&self) -> Option<&[CertificateRecord]> {
        self.state.as_loaded()
    }

    /// Check if the list is loaded and not empty.
    pub fn has_items(&self) -> bool {
        self.items().is_some_and(|items| !items.is_empty())
    }

    /// Number of loaded records.
    pub fn len(&self) -> usize {
        self.items().map_or(0, <[_]>::len)
    }

    /// Check if there are no loaded records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of a record by id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.items()?.iter().position(|item| item.id == id)
    }

    /// Get a record by id.
    pub fn get(&self, id: &str) -> Option<&CertificateRecord> {
        self.items()?.iter().find(|item| item.id == id)
    }

    /// Sequence number of the latest fetch or clear.
    pub fn current_seq(&self) -> u64 {
        self.seq
    }

    // -------------------------------------------------------------------------
    // Fetch lifecycle
    // -------------------------------------------------------------------------

    /// Drop the list and mark a new fetch as in flight.
    pub fn begin_fetch(&mut self) -> u64 {
        self.seq += 1;
        self.state = ListState::Pending { seq: self.seq };
        self.seq
    }

    /// Apply the result of the fetch tagged `seq`.
    pub fn complete_fetch(
        &mut self,
        seq: u64,
        result: Result<Vec<CertificateRecord>, SourceError>,
    ) -> FetchApplied {
        if seq != self.seq || !self.state.is_pending() {
            return FetchApplied::Stale;
        }
        match result {
            Ok(items) => {
                let len = items.len();
                self.state = ListState::Loaded(items);
                FetchApplied::Loaded(len)
            }
            Err(_) => {
                self.state = ListState::Uninitialized;
                FetchApplied::Failed
            }
        }
    }

    /// Drop the list. Any fetch in flight becomes stale.
    pub fn clear(&mut self) {
        self.seq += 1;
        self.state = ListState::Uninitialized;
    }

    // -------------------------------------------------------------------------
    // Incremental changes
    // -------------------------------------------------------------------------

    /// Replace the record with the same id in place, or append it.
    ///
    /// Ignored while the list is not loaded. A fetch in flight reflects the
    /// store at completion, and an absent list waits for the next reset.
    pub fn upsert(&mut self, record: CertificateRecord) -> Upsert {
        let ListState::Loaded(items) = &mut self.state else {
            return Upsert::Ignored;
        };
        match items.iter().position(|item| item.id == record.id) {
            Some(index) => {
                items[index] = record;
                Upsert::Updated(index)
            }
            None => {
                items.push(record);
                Upsert::Appended(items.len() - 1)
            }
        }
    }

    /// Remove a record by id.
    pub fn remove(&mut self, id: &str) -> Option<CertificateRecord> {
        let ListState::Loaded(items) = &mut self.state else {
            return None;
        };
        let index = items.iter().position(|item| item.id == id)?;
        Some(items.remove(index))
    }
}
