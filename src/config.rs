//! Ledger configuration.
//!
//! Defaults suit a local single-process ledger. [`LedgerConfig::from_env`]
//! overlays environment variables; the CLI overlays its flags on top.

use std::path::PathBuf;

use crate::error::{LedgerError, LedgerResult};

/// Directory used when neither the environment nor a flag names one.
pub const DEFAULT_DATA_DIR: &str = "./ledger";

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "CLASSLEDGER_DATA_DIR";
/// Environment variable toggling fsync after every write (`true`/`false`).
pub const ENV_SYNC_ON_WRITE: &str = "CLASSLEDGER_SYNC_ON_WRITE";
/// Environment variable holding the compaction threshold in bytes.
pub const ENV_MAX_WAL_SIZE: &str = "CLASSLEDGER_MAX_WAL_SIZE";

/// Configuration for persistent storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentConfig {
    /// Log size (bytes) past which a write triggers compaction.
    pub max_wal_size: u64,
    /// Whether to fsync after every write (slower but safer).
    pub sync_on_write: bool,
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            max_wal_size: 16 * 1024 * 1024, // 16 MB
            sync_on_write: true,
        }
    }
}

impl PersistentConfig {
    /// Smallest accepted `max_wal_size`; below this every write would compact.
    pub const MIN_WAL_SIZE: u64 = 4 * 1024;

    /// Check the configuration, returning it unchanged if valid.
    pub fn validate(self) -> LedgerResult<Self> {
        if self.max_wal_size < Self::MIN_WAL_SIZE {
            return Err(LedgerError::config(format!(
                "max_wal_size must be at least {} bytes (got {})",
                Self::MIN_WAL_SIZE,
                self.max_wal_size
            )));
        }
        Ok(self)
    }
}

/// Everything needed to open a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Directory holding the lock, log and snapshot.
    pub data_dir: PathBuf,
    /// Storage tuning.
    pub persistent: PersistentConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            persistent: PersistentConfig::default(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables (defaults in brackets):
    /// - `CLASSLEDGER_DATA_DIR` [`./ledger`]
    /// - `CLASSLEDGER_SYNC_ON_WRITE` [`true`]
    /// - `CLASSLEDGER_MAX_WAL_SIZE` [16 MiB]
    ///
    /// # Errors
    /// A variable that is set but does not parse, or a resulting
    /// configuration that fails [`validate`](Self::validate).
    pub fn from_env() -> LedgerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> LedgerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup(ENV_SYNC_ON_WRITE) {
            config.persistent.sync_on_write = raw
                .trim()
                .parse()
                .map_err(|e| LedgerError::config(format!("invalid {ENV_SYNC_ON_WRITE}: {e}")))?;
        }

        if let Some(raw) = lookup(ENV_MAX_WAL_SIZE) {
            config.persistent.max_wal_size = raw
                .trim()
                .parse()
                .map_err(|e| LedgerError::config(format!("invalid {ENV_MAX_WAL_SIZE}: {e}")))?;
        }

        config.validate()
    }

    /// Check the configuration, returning it unchanged if valid.
    pub fn validate(self) -> LedgerResult<Self> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(LedgerError::config("data_dir must not be empty"));
        }
        let persistent = self.persistent.validate()?;
        Ok(Self { persistent, ..self })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> LedgerResult<LedgerConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        LedgerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = LedgerConfig::default().validate().unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("./ledger"));
        assert!(cfg.persistent.sync_on_write);
    }

    #[test]
    fn test_rejects_tiny_wal_limit() {
        let cfg = PersistentConfig {
            max_wal_size: 16,
            ..PersistentConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_wal_size"));
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(load(&[]).unwrap(), LedgerConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = load(&[
            (ENV_DATA_DIR, "/var/lib/classledger"),
            (ENV_SYNC_ON_WRITE, "false"),
            (ENV_MAX_WAL_SIZE, "65536"),
        ])
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("/var/lib/classledger"));
        assert!(!cfg.persistent.sync_on_write);
        assert_eq!(cfg.persistent.max_wal_size, 65536);
    }

    #[test]
    fn test_blank_data_dir_keeps_default() {
        let cfg = load(&[(ENV_DATA_DIR, "  ")]).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_unparseable_values_are_config_errors() {
        let err = load(&[(ENV_SYNC_ON_WRITE, "sometimes")]).unwrap_err();
        assert!(matches!(err, LedgerError::Config { .. }));
        assert!(err.to_string().contains(ENV_SYNC_ON_WRITE));

        let err = load(&[(ENV_MAX_WAL_SIZE, "lots")]).unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_WAL_SIZE));

        let err = load(&[(ENV_MAX_WAL_SIZE, "10")]).unwrap_err();
        assert!(err.to_string().contains("max_wal_size"));
    }
}
