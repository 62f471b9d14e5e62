//! Storage-specific error type wrapping sqlx errors.

use sprinkler_domain::error::SprinklerError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be read back.
    #[error("corrupt {column} value {value:?}")]
    Corrupt { column: &'static str, value: String },

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for SprinklerError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
