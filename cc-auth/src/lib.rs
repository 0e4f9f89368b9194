//! Client certificate authorization method.
//!
//! A headless form that lists stored client certificates as radio entries,
//! tracks the selected one and turns the selection into settings for an
//! authorization flow.

pub mod bus;
pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod list;
pub mod method;
pub mod models;
pub mod selection;
pub mod settings;
pub mod source;
pub mod view;

pub use component::CcAuthorizationMethod;

pub mod prelude {
    pub use crate::bus::{NotificationBus, Subscription};
    pub use crate::component::CcAuthorizationMethod;
    pub use crate::config::MethodConfig;
    pub use crate::error::{SettingsError, SourceError};
    pub use crate::event::{ComponentEvent, Notification};
    pub use crate::list::ListState;
    pub use crate::method::AuthorizationMethod;
    pub use crate::models::{CERTIFICATES_DATASTORE, CertificateRecord, METHOD_CC, NONE_ID};
    pub use crate::selection::Selection;
    pub use crate::settings::CcSettings;
    pub use crate::source::{CertificateSource, MemorySource};
    pub use crate::view::{FormView, Navigation, ViewEntry};
}
