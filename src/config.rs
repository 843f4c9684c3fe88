//! Centralized configuration and builder for the registry.
//!
//! Goals:
//! - Single place for file locations instead of working-directory-relative constants.
//! - RegistryConfig::from_env() reads PCELICA_* env vars on top of the defaults.
//! - RegistryBuilder returns a RegistryConfig, which Registry::open_with_config consumes.
//!
//! Layout with defaults:
//! - <data_dir>/store.csv              canonical record file
//! - <data_dir>/reserved_numbers.json  reservation registry
//! - <backup_dir>/backup_*.csv         one backup per mutation (backup_dir defaults to data_dir)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::{DEFAULT_DATA_DIR, DEFAULT_DOC_PREFIX, RECORDS_FILE, RESERVED_FILE};

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "on" || s == "yes"
    })
}

/// Top-level configuration of a registry instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Directory holding the canonical files.
    /// Env: PCELICA_DATA_DIR (default "data")
    pub data_dir: PathBuf,

    /// File name of the canonical record file inside data_dir.
    pub records_file: String,

    /// File name of the reservation registry inside data_dir.
    pub reserved_file: String,

    /// Directory for backup_*.csv files. None means data_dir.
    /// Env: PCELICA_BACKUP_DIR
    pub backup_dir: Option<PathBuf>,

    /// Association prefix of document numbers ("14" gives 14-03/24).
    /// Env: PCELICA_DOC_PREFIX (default "14")
    pub doc_prefix: String,

    /// Write a backup on every persistence pass.
    /// Env: PCELICA_BACKUPS (default true)
    pub backups: bool,

    /// Hold an advisory exclusive lock on <data_dir>/LOCK while open.
    /// Env: PCELICA_LOCK (default true)
    pub lock: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            records_file: RECORDS_FILE.to_string(),
            reserved_file: RESERVED_FILE.to_string(),
            backup_dir: None,
            doc_prefix: DEFAULT_DOC_PREFIX.to_string(),
            backups: true,
            lock: true,
        }
    }
}

impl RegistryConfig {
    /// Defaults overridden by PCELICA_* environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PCELICA_DATA_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.data_dir = PathBuf::from(s);
            }
        }

        if let Ok(v) = std::env::var("PCELICA_BACKUP_DIR") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.backup_dir = Some(PathBuf::from(s));
            }
        }

        if let Ok(v) = std::env::var("PCELICA_DOC_PREFIX") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.doc_prefix = s.to_string();
            }
        }

        if let Some(on) = env_flag("PCELICA_BACKUPS") {
            cfg.backups = on;
        }
        if let Some(on) = env_flag("PCELICA_LOCK") {
            cfg.lock = on;
        }

        cfg
    }

    /// Config rooted at `data_dir`, everything else default (env is not read).
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.backup_dir = dir;
        self
    }

    pub fn with_doc_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.doc_prefix = prefix.into();
        self
    }

    pub fn with_backups(mut self, on: bool) -> Self {
        self.backups = on;
        self
    }

    pub fn with_lock(mut self, on: bool) -> Self {
        self.lock = on;
        self
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }

    pub fn reserved_path(&self) -> PathBuf {
        self.data_dir.join(&self.reserved_file)
    }

    pub fn backup_root(&self) -> &Path {
        self.backup_dir.as_deref().unwrap_or(&self.data_dir)
    }
}

impl fmt::Display for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegistryConfig {{ \
             data_dir: {}, \
             records_file: {}, \
             reserved_file: {}, \
             backup_dir: {}, \
             doc_prefix: {}, \
             backups: {}, \
             lock: {} \
             }}",
            self.data_dir.display(),
            self.records_file,
            self.reserved_file,
            self.backup_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default(<data_dir>)".to_string()),
            self.doc_prefix,
            self.backups,
            self.lock,
        )
    }
}

/// Lightweight builder that produces a RegistryConfig.
#[derive(Clone, Debug)]
pub struct RegistryBuilder {
    cfg: RegistryConfig,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: RegistryConfig::from_env(),
        }
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: RegistryConfig::default(),
        }
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.data_dir = dir.into();
        self
    }

    pub fn backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cfg.backup_dir = Some(dir.into());
        self
    }

    pub fn doc_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.cfg.doc_prefix = prefix.into();
        self
    }

    pub fn backups(mut self, on: bool) -> Self {
        self.cfg.backups = on;
        self
    }

    pub fn lock(mut self, on: bool) -> Self {
        self.cfg.lock = on;
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> RegistryConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_live_under_data_dir() {
        let cfg = RegistryConfig::at("/tmp/reg");
        assert_eq!(cfg.records_path(), PathBuf::from("/tmp/reg/store.csv"));
        assert_eq!(
            cfg.reserved_path(),
            PathBuf::from("/tmp/reg/reserved_numbers.json")
        );
        assert_eq!(cfg.backup_root(), Path::new("/tmp/reg"));
    }

    #[test]
    fn builder_overrides_backup_dir_and_prefix() {
        let cfg = RegistryBuilder::from_default()
            .data_dir("d")
            .backup_dir("b")
            .doc_prefix("07")
            .backups(false)
            .build();
        assert_eq!(cfg.backup_root(), Path::new("b"));
        assert_eq!(cfg.doc_prefix, "07");
        assert!(!cfg.backups);
        assert!(cfg.to_string().contains("doc_prefix: 07"));
    }
}
