//! Configuration flags of the authorization form.

use serde::Deserialize;
use serde::Serialize;

use crate::error::SettingsError;

/// Default heading above the certificate list.
pub const DEFAULT_TITLE: &str = "Select a certificate";

/// Default text shown when there are no certificates.
pub const DEFAULT_EMPTY_MESSAGE: &str = "There are no certificates installed in this application.";

/// Host-provided options of the client certificate form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodConfig {
    /// Offer a "none" entry ahead of the certificates.
    pub none: bool,
    /// Render with the compatibility (Anypoint) style.
    pub compatibility: bool,
    /// Render with the outlined style.
    pub outlined: bool,
    /// Heading above the list.
    pub title: String,
    /// Text of the empty state.
    pub empty_message: String,
}

impl Default for MethodConfig {
    fn default() -> Self {
        Self {
            none: false,
            compatibility: false,
            outlined: false,
            title: DEFAULT_TITLE.to_string(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
        }
    }
}

impl MethodConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the "none" entry.
    pub fn with_none(mut self, none: bool) -> Self {
        self.none = none;
        self
    }

    /// Use the compatibility style.
    pub fn with_compatibility(mut self, compatibility: bool) -> Self {
        self.compatibility = compatibility;
        self
    }

    /// Use the outlined style.
    pub fn with_outlined(mut self, outlined: bool) -> Self {
        self.outlined = outlined;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }
}
