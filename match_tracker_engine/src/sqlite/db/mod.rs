//! # SQLite Database methods
//!
//! Low-level SQLite interactions, as plain functions that accept a `&mut SqliteConnection`. Callers pass a pooled
//! connection, or `&mut *tx` when several calls must be atomic.
use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use super::SqliteDatabaseError;

pub mod events;
pub mod matches;
pub mod roster;
pub mod stats;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
