//! Simulator error types

use thiserror::Error;
use winarray_remote::RemoteArrayError;

/// Errors that stop a simulation before it runs
#[derive(Error, Debug)]
pub enum SimError {
    /// Config file unreadable
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered
    #[error("cannot render config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Value out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The array refused to start
    #[error(transparent)]
    Array(#[from] RemoteArrayError),
}
