//! # Torture Configuration
//!
//! Loaded once at startup from TOML, then overridden by command-line flags.
//!
//! ```toml
//! threads = 8
//! write_percent = 10
//! operations_per_thread = 10000
//! hold_micros = 5
//! seed = 42
//! ```
//!
//! Every field is optional; missing fields take their [`Default`] value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TortureError, TortureResult};

/// Upper bound on worker threads; beyond this the run measures the scheduler.
pub const MAX_THREADS: usize = 1024;

/// Shape of a torture run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TortureConfig {
    /// Worker threads hammering the lock.
    pub threads: usize,
    /// Share of operations that are writes (0-100).
    pub write_percent: u8,
    /// Lock acquisitions per worker.
    pub operations_per_thread: usize,
    /// Time spent inside each critical section (µs). Zero means no sleep.
    pub hold_micros: u64,
    /// Base seed; worker `i` uses `seed + i`.
    pub seed: u64,
}

impl Default for TortureConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            write_percent: 10,
            operations_per_thread: 10_000,
            hold_micros: 0,
            seed: 0x5EED,
        }
    }
}

impl TortureConfig {
    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `TortureError::ConfigParse` on malformed TOML or unknown keys,
    /// and `TortureError::InvalidConfig` if a value is out of range.
    pub fn from_toml_str(text: &str) -> TortureResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns `TortureError::ConfigIo` if the file cannot be read, otherwise
    /// the same errors as [`TortureConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> TortureResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TortureError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `TortureError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> TortureResult<()> {
        if self.threads == 0 {
            return Err(TortureError::InvalidConfig(
                "threads must be at least 1".to_string(),
            ));
        }
        if self.threads > MAX_THREADS {
            return Err(TortureError::InvalidConfig(format!(
                "threads must be at most {MAX_THREADS}, got {}",
                self.threads
            )));
        }
        if self.write_percent > 100 {
            return Err(TortureError::InvalidConfig(format!(
                "write_percent must be 0-100, got {}",
                self.write_percent
            )));
        }
        if self.operations_per_thread == 0 {
            return Err(TortureError::InvalidConfig(
                "operations_per_thread must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Total lock acquisitions across all workers.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        (self.threads as u64).saturating_mul(self.operations_per_thread as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TortureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TortureConfig::from_toml_str("threads = 3\nseed = 7\n").unwrap();
        assert_eq!(config.threads, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.write_percent, TortureConfig::default().write_percent);
    }

    #[test]
    fn test_full_toml() {
        let text = r"
            threads = 4
            write_percent = 50
            operations_per_thread = 100
            hold_micros = 2
            seed = 1
        ";
        let config = TortureConfig::from_toml_str(text).unwrap();
        assert_eq!(
            config,
            TortureConfig {
                threads: 4,
                write_percent: 50,
                operations_per_thread: 100,
                hold_micros: 2,
                seed: 1,
            }
        );
        assert_eq!(config.total_operations(), 400);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = TortureConfig::from_toml_str("readers = 3\n");
        assert!(matches!(result, Err(TortureError::ConfigParse(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let result = TortureConfig::from_toml_str("write_percent = 101\n");
        assert!(matches!(result, Err(TortureError::InvalidConfig(_))));

        let result = TortureConfig::from_toml_str("threads = 0\n");
        assert!(matches!(result, Err(TortureError::InvalidConfig(_))));

        let result = TortureConfig::from_toml_str("operations_per_thread = 0\n");
        assert!(matches!(result, Err(TortureError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = TortureConfig::load("/nonexistent/turnstile/torture.toml");
        assert!(matches!(result, Err(TortureError::ConfigIo { .. })));
    }
}
