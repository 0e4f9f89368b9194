//! View derivation for the certificate radio group.
//!
//! The view is a pure function of the list, the selection and the config.

use chrono::DateTime;
use chrono::Utc;

use crate::config::MethodConfig;
use crate::list::CertificateList;
use crate::models::NONE_ID;
use crate::selection::SelectionState;

/// Label of the synthetic "none" entry.
pub const NONE_LABEL: &str = "None";

/// One radio entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    /// Id the entry selects.
    pub id: String,
    /// Certificate name, or [`NONE_LABEL`].
    pub label: String,
    /// "Added: ..." line. `None` for the "none" entry.
    pub created: Option<String>,
    /// Whether the entry is checked.
    pub selected: bool,
}

impl ViewEntry {
    /// Check if this is the synthetic "none" entry.
    pub fn is_none_entry(&self) -> bool {
        self.created.is_none() && self.id == NONE_ID
    }
}

/// What the form shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormView {
    /// No certificates.
    Empty { message: String },
    /// A radio group of certificates.
    List {
        title: String,
        entries: Vec<ViewEntry>,
        compatibility: bool,
        outlined: bool,
    },
}

impl FormView {
    /// Derive the view.
    pub fn derive(list: &CertificateList, selection: &SelectionState, config: &MethodConfig) -> Self {
        let items = match list.items() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return Self::Empty {
                    message: config.empty_message.clone(),
                };
            }
        };

        let mut entries = Vec::with_capacity(items.len() + 1);
        if config.none {
            entries.push(ViewEntry {
                id: NONE_ID.to_string(),
                label: NONE_LABEL.to_string(),
                created: None,
                selected: selection.is_selected_id(NONE_ID),
            });
        }
        entries.extend(items.iter().map(|item| ViewEntry {
            id: item.id.clone(),
            label: item.name.clone(),
            created: Some(format!("Added: {}", format_created(&item.created))),
            selected: selection.is_selected_id(&item.id),
        }));

        Self::List {
            title: config.title.clone(),
            entries,
            compatibility: config.compatibility,
            outlined: config.outlined,
        }
    }

    /// Check if this is the empty state.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty { .. })
    }

    /// Radio entries. Empty for the empty state.
    pub fn entries(&self) -> &[ViewEntry] {
        match self {
            Self::Empty { .. } => &[],
            Self::List { entries, .. } => entries,
        }
    }

    /// Row of the checked entry.
    pub fn selected_row(&self) -> Option<usize> {
        self.entries().iter().position(|entry| entry.selected)
    }
}

/// Numeric date and time, e.g. `1/31/2020, 4:05 PM`.
pub fn format_created(created: &DateTime<Utc>) -> String {
    created.format("%-m/%-d/%Y, %-I:%M %p").to_string()
}

// =============================================================================
// Text rendering
// =============================================================================

/// Options for [`render_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Indicator of the checked entry.
    pub selected_char: char,
    /// Indicator of unchecked entries.
    pub unselected_char: char,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            selected_char: '◉',
            unselected_char: '◯',
        }
    }
}

/// Render the view as plain text lines.
pub fn render_text(view: &FormView, options: &RenderOptions) -> Vec<String> {
    match view {
        FormView::Empty { message } => vec![message.clone()],
        FormView::List { title, entries, .. } => {
            let mut lines = Vec::with_capacity(entries.len() * 2 + 1);
            lines.push(title.clone());
            for entry in entries {
                let indicator = if entry.selected {
                    options.selected_char
                } else {
                    options.unselected_char
                };
                lines.push(format!("{} {}", indicator, entry.label));
                if let Some(created) = &entry.created {
                    lines.push(format!("  {}", created));
                }
            }
            lines
        }
    }
}

// =============================================================================
// Keyboard navigation
// =============================================================================

/// Keyboard-style movement within the radio group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Previous entry, wrapping to the last.
    Up,
    /// Next entry, wrapping to the first.
    Down,
    /// First entry.
    First,
    /// Last entry.
    Last,
}

impl Navigation {
    /// Row to select, given the current row and the number of rows.
    pub fn target(self, current: Option<usize>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let current = current.unwrap_or(0);
        Some(match self {
            Self::Up => {
                if current == 0 {
                    len - 1
                } else {
                    current - 1
                }
            }
            Self::Down => {
                if current + 1 >= len {
                    0
                } else {
                    current + 1
                }
            }
            Self::First => 0,
            Self::Last => len - 1,
        })
    }
}
