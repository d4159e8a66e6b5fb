/*!
 * Error types for Craftlink
 *
 * Remote call failures never appear here: the query layer and the preflight
 * runner absorb them. These are the errors of the ambient surface (loading
 * configuration, installing logging, serializing a report).
 */

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CraftlinkError>;

#[derive(Error, Debug)]
pub enum CraftlinkError {
    /// Configuration value out of range or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Diagnostics report serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Logging subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl CraftlinkError {
    /// Check if this error came from user-supplied configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CraftlinkError::Config(_) | CraftlinkError::ConfigParse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_classified() {
        assert!(CraftlinkError::Config("bad".into()).is_config_error());
        assert!(!CraftlinkError::Logging("bad".into()).is_config_error());
    }

    #[test]
    fn test_io_conversion() {
        let err: CraftlinkError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
