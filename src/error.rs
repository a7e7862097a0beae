//! Error types for the dashboard

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database file not found: {0}")]
    DatabaseNotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid row {row} in table '{table}': {reason}")]
    InvalidRow {
        table: String,
        row: usize,
        reason: String,
    },

    #[error("Failed to parse timestamp: {0}")]
    TimestampParse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures of the database load step (missing file, connection,
    /// query or schema problems).
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::DatabaseNotFound(_)
                | Error::DatabaseError(_)
                | Error::MissingColumn { .. }
                | Error::InvalidRow { .. }
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
