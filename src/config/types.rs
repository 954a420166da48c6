//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Where to start reading a file that has no prior checkpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartPosition {
    /// Read the whole file from byte 0.
    Beginning,
    /// Skip pre-existing content, only tail new writes.
    #[default]
    End,
}

/// Polling intervals for the monitor and worker loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// How often the change monitor scans the modified registry (ms).
    pub change_interval_ms: u64,
    /// How often directory entries are rescanned for new files (ms).
    pub discovery_interval_ms: u64,
    /// How long a worker blocks waiting for a queued path (ms).
    pub dequeue_timeout_ms: u64,
    /// Maximum single sleep increment; bounds shutdown latency (ms).
    pub shutdown_slice_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            change_interval_ms: 2_000,
            discovery_interval_ms: 10_000,
            dequeue_timeout_ms: 10_000,
            shutdown_slice_ms: 2_000,
        }
    }
}

/// Configuration for the tailing engine.
///
/// Constructed once at startup and passed to every component; never
/// read from ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailConfig {
    /// Files or directories to tail. Required, non-empty.
    pub path: Vec<PathBuf>,
    /// Literal file or directory paths removed from the tailed set.
    #[serde(default)]
    pub exclude: Vec<PathBuf>,
    /// Maximum number of tracked files; 0 means unlimited.
    #[serde(default)]
    pub max_open_files: usize,
    /// Start position for files with no prior checkpoint.
    #[serde(default)]
    pub start_position: StartPosition,
    /// Path of the durable offset snapshot.
    #[serde(default = "default_since_db_path")]
    pub since_db_path: PathBuf,
    /// Seconds between periodic since-db dumps.
    #[serde(default = "default_since_db_write_interval")]
    pub since_db_write_interval: u64,
    /// Checkpoint the in-memory offset every this many consumed records.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every_records: usize,
    /// Record delimiter. Must be an ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Text encoding of tailed files. Only UTF-8 is supported.
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Number of tail workers draining the pending queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Polling intervals.
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_since_db_path() -> PathBuf {
    PathBuf::from("./sincedb.yaml")
}

fn default_since_db_write_interval() -> u64 {
    15
}

fn default_checkpoint_every() -> usize {
    1000
}

fn default_delimiter() -> char {
    '\n'
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_workers() -> usize {
    1
}

impl TailConfig {
    /// Create a configuration for the given paths with defaults elsewhere.
    #[must_use]
    pub fn for_paths(path: Vec<PathBuf>) -> Self {
        Self {
            path,
            exclude: Vec::new(),
            max_open_files: 0,
            start_position: StartPosition::default(),
            since_db_path: default_since_db_path(),
            since_db_write_interval: default_since_db_write_interval(),
            checkpoint_every_records: default_checkpoint_every(),
            delimiter: default_delimiter(),
            encoding: default_encoding(),
            workers: default_workers(),
            poll: PollConfig::default(),
        }
    }

    /// Validate operator-supplied values.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty path list, a non-ASCII delimiter,
    /// an unsupported encoding, or a zero-sized worker pool. All of
    /// these are fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::EmptyPathList);
        }
        if !self.delimiter.is_ascii() {
            return Err(ConfigError::NonAsciiDelimiter(self.delimiter));
        }
        if !self.encoding.eq_ignore_ascii_case("utf-8") {
            return Err(ConfigError::UnsupportedEncoding(self.encoding.clone()));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(())
    }

    /// The delimiter as a raw byte.
    ///
    /// Valid after [`validate`](Self::validate) has accepted the config.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TailConfig::for_paths(vec![PathBuf::from("/var/log/app.log")]);
        assert_eq!(config.start_position, StartPosition::End);
        assert_eq!(config.since_db_path, PathBuf::from("./sincedb.yaml"));
        assert_eq!(config.since_db_write_interval, 15);
        assert_eq!(config.checkpoint_every_records, 1000);
        assert_eq!(config.delimiter, '\n');
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.workers, 1);
        assert_eq!(config.max_open_files, 0);
        assert!(config.exclude.is_empty());
    }

    #[test]
    fn test_poll_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.change_interval_ms, 2_000);
        assert_eq!(poll.discovery_interval_ms, 10_000);
        assert_eq!(poll.dequeue_timeout_ms, 10_000);
        assert_eq!(poll.shutdown_slice_ms, 2_000);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml_str = r#"
            path = ["/var/log/syslog"]
        "#;
        let config: TailConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.path, vec![PathBuf::from("/var/log/syslog")]);
        assert_eq!(config.start_position, StartPosition::End);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_full() {
        let toml_str = r#"
            path = ["/var/log", "/tmp/app.log"]
            exclude = ["/var/log/secure"]
            max_open_files = 128
            start_position = "beginning"
            since_db_path = "/var/lib/sincetail/sincedb.yaml"
            since_db_write_interval = 30
            checkpoint_every_records = 500
            workers = 4

            [poll]
            change_interval_ms = 250
            discovery_interval_ms = 1000
        "#;
        let config: TailConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.path.len(), 2);
        assert_eq!(config.start_position, StartPosition::Beginning);
        assert_eq!(config.max_open_files, 128);
        assert_eq!(config.checkpoint_every_records, 500);
        assert_eq!(config.workers, 4);
        assert_eq!(config.poll.change_interval_ms, 250);
        // Unspecified poll fields keep their defaults.
        assert_eq!(config.poll.dequeue_timeout_ms, 10_000);
    }

    #[test]
    fn test_validate_empty_path_list() {
        let config = TailConfig::for_paths(Vec::new());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPathList)));
    }

    #[test]
    fn test_validate_non_ascii_delimiter() {
        let mut config = TailConfig::for_paths(vec![PathBuf::from("/tmp/a.log")]);
        config.delimiter = '§';
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonAsciiDelimiter('§'))
        ));
    }

    #[test]
    fn test_validate_unsupported_encoding() {
        let mut config = TailConfig::for_paths(vec![PathBuf::from("/tmp/a.log")]);
        config.encoding = "GBK".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_validate_encoding_case_insensitive() {
        let mut config = TailConfig::for_paths(vec![PathBuf::from("/tmp/a.log")]);
        config.encoding = "utf-8".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut config = TailConfig::for_paths(vec![PathBuf::from("/tmp/a.log")]);
        config.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_delimiter_byte() {
        let config = TailConfig::for_paths(vec![PathBuf::from("/tmp/a.log")]);
        assert_eq!(config.delimiter_byte(), b'\n');
    }

    #[test]
    fn test_start_position_serde_names() {
        assert_eq!(
            toml::from_str::<TailConfig>("path = [\"/x\"]\nstart_position = \"end\"")
                .unwrap()
                .start_position,
            StartPosition::End
        );
        assert_eq!(
            toml::from_str::<TailConfig>("path = [\"/x\"]\nstart_position = \"beginning\"")
                .unwrap()
                .start_position,
            StartPosition::Beginning
        );
    }
}
