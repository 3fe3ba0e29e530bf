use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The generated order number is already taken by another order.
    #[error("Order number already exists: {0}")]
    DuplicateOrderNumber(String),

    /// A user with this email is already registered.
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// A row referenced by the write does not exist.
    #[error("Referenced row not found: {0}")]
    ForeignKey(String),

    /// The write is not valid within the current transaction.
    #[error("Invalid write: {0}")]
    InvalidWrite(&'static str),

    /// A write failed on purpose (in-memory fault injection).
    #[error("Injected failure: {0}")]
    Injected(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Stored data could not be mapped back into a record.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
