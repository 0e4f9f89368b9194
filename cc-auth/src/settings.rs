//! Persisted settings of the client certificate method.
//!
//! The wire format is either `{}` (nothing selected) or
//! `{"id": "<certificate id>"}`.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::SettingsError;

/// Serialized form of the method's user input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcSettings {
    /// Id of the selected certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CcSettings {
    /// Settings with nothing selected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Settings selecting the given certificate.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// Parse settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode settings as a JSON string.
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode settings as a JSON value.
    pub fn to_value(&self) -> Result<Value, SettingsError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Read settings from an arbitrary JSON value.
    ///
    /// Anything that is not an object, and an `id` that is not a string,
    /// reads as empty settings.
    pub fn from_value(value: &Value) -> Self {
        let id = value
            .as_object()
            .and_then(|map| map.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { id }
    }
}
