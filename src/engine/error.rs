//! Engine error types.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors that can occur while starting or running the engine.
///
/// Every variant except `Io` is fatal at startup: the engine refuses to
/// start partially configured. Per-file trouble during tailing is logged
/// and skipped instead of surfacing here.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// A configured path does not exist.
    #[error("Configured path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// An exclusion entry does not exist (strict mode only).
    #[error("Exclusion path does not exist: {0}")]
    ExcludeNotFound(PathBuf),

    /// The resolved file set exceeds `max_open_files`.
    #[error("Resolved {count} files, exceeding the limit of {limit}")]
    TooManyFiles { count: usize, limit: usize },

    /// The since-db file exists but cannot be read.
    #[error("Since-db {path} is unreadable: {source}")]
    SinceDbUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_not_found_display() {
        let err = EngineError::PathNotFound(PathBuf::from("/var/log/missing"));
        assert_eq!(
            err.to_string(),
            "Configured path does not exist: /var/log/missing"
        );
    }

    #[test]
    fn test_too_many_files_display() {
        let err = EngineError::TooManyFiles {
            count: 12,
            limit: 10,
        };
        assert_eq!(err.to_string(), "Resolved 12 files, exceeding the limit of 10");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn test_from_config_error() {
        let err: EngineError = ConfigError::EmptyPathList.into();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("Configuration error"));
    }
}
