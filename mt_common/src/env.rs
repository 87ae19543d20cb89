//! Environment variable helpers.
//!
//! Configuration in the match tracker is read from the environment exactly once at start-up. These helpers never
//! fail on a malformed value: they log a warning and fall back to the default instead. Use [`required_env`] for the
//! few values without a sensible default.
use std::{env, fmt::Display, str::FromStr};

use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EnvError {
    #[error("Environment variable {0} is not set")]
    Missing(String),
    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads a boolean flag from the environment variable `name`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

/// Reads and parses `name`, returning `default` if the variable is missing or cannot be parsed.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

/// Reads a comma-separated list from `name`. Empty entries are dropped.
pub fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|s| s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect())
        .unwrap_or_default()
}

/// Reads `name`, returning an error if it is not set.
pub fn required_env(name: &str) -> Result<String, EnvError> {
    env::var(name).map_err(|e| match e {
        env::VarError::NotPresent => EnvError::Missing(name.to_string()),
        env::VarError::NotUnicode(_) => EnvError::NotUnicode(name.to_string()),
    })
}
