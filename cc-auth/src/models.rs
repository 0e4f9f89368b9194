//! Certificate records and the fixed identifiers of this authorization method.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Type tag of the client certificate authorization method.
pub const METHOD_CC: &str = "client certificate";

/// Name of the data store holding client certificates.
pub const CERTIFICATES_DATASTORE: &str = "client-certificates";

/// Identifier used by the synthetic "none" entry.
pub const NONE_ID: &str = "none";

/// A stored client certificate, as seen by the authorization form.
///
/// Only the fields the form displays are modeled. Anything else the data
/// store keeps (certificate material, key, type) is ignored on deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Creation time, stored as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
}

impl CertificateRecord {
    /// Create a record.
    pub fn new(id: impl Into<String>, name: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created,
        }
    }

    /// Return a copy with a different display name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
