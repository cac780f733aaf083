use std::path::PathBuf;

use thiserror::Error;

/// Failures that keep the database handle from ever being published.
#[derive(Debug, Error)]
pub enum BootError {
    #[error("failed to read snapshot {}: {source}", path.display())]
    Fetch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("query engine failed to start: {0}")]
    Engine(#[source] sqlx::Error),
    #[error("snapshot is not an SQLite database ({0} bytes)")]
    InvalidSnapshot(usize),
    #[error("failed to write scratch copy: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to open snapshot: {0}")]
    Open(String),
    #[error("bootstrap ended before the database was published")]
    Interrupted,
}

/// A query the engine rejected. Shown to the user, never fatal.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Engine(String),
    #[error("{0}")]
    Driver(#[source] sqlx::Error),
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => QueryError::Engine(db_err.message().to_string()),
            other => QueryError::Driver(other),
        }
    }
}

/// Failures while building a snapshot from the ytenx text files.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing source files in {}: {files}", dir.display())]
    MissingSources { dir: PathBuf, files: String },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file} has no entries")]
    Empty { file: &'static str },
    #[error("{file} has no column {column}")]
    MissingColumn { file: &'static str, column: &'static str },
    #[error("{file}:{line}: {reason}")]
    Malformed {
        file: &'static str,
        line: usize,
        reason: String,
    },
    #[error("failed to write {}: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
