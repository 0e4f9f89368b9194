//! SQLite certificate store publishing change notifications.
//!
//! Plays the data model the form consumes: it answers list queries, commits
//! insert/delete requests and announces committed changes on the bus.

use std::path::Path;

use async_sqlite::Client;
use async_trait::async_trait;
use cc_auth::bus::NotificationBus;
use cc_auth::error::SourceError;
use cc_auth::event::Notification;
use cc_auth::models::{CERTIFICATES_DATASTORE, CertificateRecord};
use cc_auth::source::CertificateSource;
use chrono::DateTime;
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),
    #[error("settings encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// SQLite-backed client certificate store.
pub struct CertificateStore {
    client: Client,
    bus: NotificationBus,
}

impl CertificateStore {
    /// Open the store at the given path and announce changes on `bus`.
    pub async fn open(path: impl AsRef<Path>, bus: NotificationBus) -> Result<Self, StoreError> {
        let client = async_sqlite::ClientBuilder::new()
            .path(path)
            .open()
            .await?;

        client
            .conn(|conn| {
                conn.execute_batch(
                    "
                    CREATE TABLE IF NOT EXISTS certificates (
                        id TEXT PRIMARY KEY,
                        name TEXT NOT NULL,
                        created INTEGER NOT NULL
                    );

                    CREATE TABLE IF NOT EXISTS settings (
                        key TEXT PRIMARY KEY,
                        value TEXT NOT NULL
                    );
                    ",
                )
            })
            .await?;

        Ok(Self { client, bus })
    }

    // =========================================================================
    // Certificates
    // =========================================================================

    /// List certificates in insertion order.
    pub async fn list(&self) -> Result<Vec<CertificateRecord>, StoreError> {
        self.client
            .conn(|conn| {
                let mut stmt =
                    conn.prepare("SELECT id, name, created FROM certificates ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| {
                    let created: i64 = row.get(2)?;
                    Ok(CertificateRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created: DateTime::from_timestamp_millis(created).unwrap_or_default(),
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(StoreError::from)
    }

    /// Write records without announcing them, as a bulk import does.
    pub async fn import(&self, records: Vec<CertificateRecord>) -> Result<usize, StoreError> {
        let count = records.len();
        self.client
            .conn_mut(move |conn| {
                let tx = conn.transaction()?;
                for record in &records {
                    upsert_row(&tx, record)?;
                }
                tx.commit()
            })
            .await?;
        debug!("CertificateStore: imported {} certificate(s)", count);
        Ok(count)
    }

    /// Insert or update a certificate and announce it.
    pub async fn put(&self, record: CertificateRecord) -> Result<(), StoreError> {
        let row = record.clone();
        self.client
            .conn(move |conn| upsert_row(conn, &row))
            .await?;
        self.bus.publish(Notification::upserted(record));
        Ok(())
    }

    /// Delete a certificate and announce it. Returns `false` if it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id_owned = id.to_string();
        let removed = self
            .client
            .conn(move |conn| conn.execute("DELETE FROM certificates WHERE id = ?", [&id_owned]))
            .await?;
        if removed > 0 {
            self.bus.publish(Notification::deleted(id));
        }
        Ok(removed > 0)
    }

    /// Delete every certificate and announce the store as destroyed.
    pub async fn destroy(&self) -> Result<(), StoreError> {
        self.client
            .conn(|conn| conn.execute("DELETE FROM certificates", []))
            .await?;
        self.bus.publish(Notification::destroyed(CERTIFICATES_DATASTORE));
        Ok(())
    }

    /// Take over a cancelable request and commit it.
    ///
    /// Returns `true` if the notification was a request this store handled.
    pub async fn handle_request(&self, notification: Notification) -> Result<bool, StoreError> {
        match notification {
            Notification::CertificateUpserted {
                record,
                cancelable: true,
            } => {
                self.put(record).await?;
                Ok(true)
            }
            Notification::CertificateDeleted {
                id,
                cancelable: true,
            } => {
                self.delete(&id).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Get a JSON-encoded setting.
    pub async fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let key_owned = key.to_string();
        let raw = self
            .client
            .conn(move |conn| {
                let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?")?;
                let mut rows = stmt.query([&key_owned])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get::<_, String>(0)?)),
                    None => Ok(None),
                }
            })
            .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Set a JSON-encoded setting.
    pub async fn set_setting<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let key_owned = key.to_string();
        let raw = serde_json::to_string(value)?;
        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO settings (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![&key_owned, &raw],
                )
            })
            .await?;
        Ok(())
    }
}

fn upsert_row(conn: &rusqlite::Connection, record: &CertificateRecord) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "INSERT INTO certificates (id, name, created) VALUES (?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, created = excluded.created",
        rusqlite::params![&record.id, &record.name, record.created.timestamp_millis()],
    )
}

#[async_trait]
impl CertificateSource for CertificateStore {
    async fn list_certificates(&self) -> Result<Vec<CertificateRecord>, SourceError> {
        self.list()
            .await
            .map_err(|err| SourceError::Storage(err.to_string()))
    }
}
