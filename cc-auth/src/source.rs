//! The data collaborator that lists stored certificates.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::CertificateRecord;

/// Lists the stored client certificates.
///
/// Timeouts and retries are the implementation's business. The component
/// treats any error as "no data".
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// Fetch all stored certificates, in store order.
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError>;
}

#[async_trait]
impl<T: CertificateSource + ?Sized> CertificateSource for Arc<T> {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        (**self).list_certificates().await
    }
}

/// In-memory certificate source.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    records: Arc<RwLock<Vec<CertificateRecord>>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source holding the given records.
    pub fn with_records(records: Vec<CertificateRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Replace all records.
    pub fn set_records(&self, records: Vec<CertificateRecord>) {
        if let Ok(mut guard) = self.records.write() {
            *guard = records;
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Check if the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CertificateSource for MemorySource {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        self.records
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SourceError::Storage("certificate list lock poisoned".to_string()))
    }
}
