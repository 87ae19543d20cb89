//! Utilities shared by the match tracker crates.
//!
//! * [`Secret`] wraps configuration values that must never end up in logs.
//! * The [`env`] helpers read and parse environment variables, logging (rather than failing on) bad values.
pub mod env;
mod secret;

pub use env::{env_flag, env_list, env_or_default, parse_boolean_flag, required_env, EnvError};
pub use secret::Secret;
