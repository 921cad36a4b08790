//! Common error types for the APT data manager

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for data manager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the data manager
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested dataset, sample, reconstruction, analysis or file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input (names, file types, request fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A directory with the requested name already exists in its parent
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Mutation attempted on a dataset that has been published
    #[error("Dataset {0} has already been published")]
    Published(String),

    /// Metadata document failed to parse or validate.
    ///
    /// `errors` is never empty.
    #[error("{}: {} metadata error(s)", path.display(), errors.len())]
    Metadata { path: PathBuf, errors: Vec<String> },
}

impl Error {
    /// Build a metadata error from a single message
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Metadata {
            path: path.into(),
            errors: vec![message.into()],
        }
    }

    /// All human-readable problems carried by this error.
    ///
    /// Metadata errors expand to each individual violation; every other
    /// variant yields its display string.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Error::Metadata { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}
