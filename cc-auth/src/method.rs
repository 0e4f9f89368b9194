//! Interface shared by authorization method forms.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// An authorization method form.
///
/// Each method has a fixed type tag, produces a settings object from user
/// input and can restore that input from previously produced settings.
pub trait AuthorizationMethod {
    /// Serialized user input.
    type Settings: Serialize + DeserializeOwned + Default;

    /// Fixed type tag of the method.
    fn method_type(&self) -> &'static str;

    /// Validate user input.
    fn validate(&self) -> bool;

    /// Settings for the current user input.
    fn serialize(&self) -> Self::Settings;

    /// Restore user input from settings.
    fn restore(&mut self, settings: Self::Settings);
}
