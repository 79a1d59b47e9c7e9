use thiserror::Error;

/// Errors surfaced by the habitline library.
///
/// Idempotent outcomes ("plan already exists", "item already done") are not
/// errors; they are reported through outcome enums in [`crate::models`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Setup failed: {0}")]
    Setup(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
