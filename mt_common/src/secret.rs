use std::{
    fmt,
    fmt::{Debug, Display},
};

use serde::Deserialize;

/// A configuration value that is redacted whenever it is formatted.
///
/// Use [`Secret::reveal`] at the single point where the raw value is needed (e.g. building an HTTP header).
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    /// Reads the secret from the given environment variable. Missing or non-unicode values yield an empty secret.
    pub fn from_env(name: &str) -> Self {
        Self::new(std::env::var(name).unwrap_or_default())
    }

    /// True if no value has been configured.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
