//! Selection state of the certificate radio group.

use std::fmt;

use crate::models::NONE_ID;
use crate::settings::CcSettings;

/// What the user picked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    /// The synthetic "none" entry: explicitly no certificate.
    NoCertificate,
    /// A stored certificate, by id.
    Certificate(String),
}

impl Selection {
    /// Select a certificate by id.
    pub fn certificate(id: impl Into<String>) -> Self {
        Self::Certificate(id.into())
    }

    /// Interpret an id as it appears in settings or in the view.
    ///
    /// The reserved [`NONE_ID`] maps to [`Selection::NoCertificate`].
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        if id == NONE_ID {
            Self::NoCertificate
        } else {
            Self::Certificate(id)
        }
    }

    /// Id as it appears in the view.
    pub fn as_id(&self) -> &str {
        match self {
            Self::NoCertificate => NONE_ID,
            Self::Certificate(id) => id,
        }
    }

    /// The certificate id, unless this is the "none" entry.
    pub fn certificate_id(&self) -> Option<&str> {
        match self {
            Self::NoCertificate => None,
            Self::Certificate(id) => Some(id),
        }
    }

    /// Check if this is the "none" entry.
    pub fn is_no_certificate(&self) -> bool {
        matches!(self, Self::NoCertificate)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_id())
    }
}

/// Holds the single optional selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<Selection>,
}

impl SelectionState {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Read methods
    // -------------------------------------------------------------------------

    /// Get the current selection.
    pub fn get(&self) -> Option<&Selection> {
        self.selected.as_ref()
    }

    /// Get the selected id as it appears in the view.
    pub fn id(&self) -> Option<&str> {
        self.selected.as_ref().map(Selection::as_id)
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }

    /// Check if the given view id is the selected one.
    pub fn is_selected_id(&self, id: &str) -> bool {
        self.id() == Some(id)
    }

    // -------------------------------------------------------------------------
    // Write methods
    // -------------------------------------------------------------------------

    /// Replace the selection. Returns `true` when the value changed.
    pub fn set(&mut self, selection: Option<Selection>) -> bool {
        if self.selected == selection {
            return false;
        }
        self.selected = selection;
        true
    }

    /// Clear the selection. Returns `true` when something was selected.
    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Clear the selection if it points at the given certificate.
    pub fn clear_certificate(&mut self, id: &str) -> bool {
        let matches = self
            .selected
            .as_ref()
            .and_then(Selection::certificate_id)
            .is_some_and(|selected| selected == id);
        if matches {
            self.selected = None;
        }
        matches
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    /// Settings for the current selection. The "none" entry serializes as
    /// nothing selected.
    pub fn serialize(&self) -> CcSettings {
        match self.selected.as_ref().and_then(Selection::certificate_id) {
            Some(id) => CcSettings::with_id(id),
            None => CcSettings::empty(),
        }
    }

    /// Restore the selection from settings. Returns `true` when the value changed.
    pub fn restore(&mut self, settings: CcSettings) -> bool {
        self.set(settings.id.map(Selection::from_id))
    }
}
