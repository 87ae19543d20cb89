use thiserror::Error;

use crate::traits::MatchStoreError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not run database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl From<SqliteDatabaseError> for MatchStoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        MatchStoreError::DatabaseError(e.to_string())
    }
}
