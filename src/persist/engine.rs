//! PersistenceEngine: load on open, full rewrite + backup after every mutation.
//!
//! Политика ошибок:
//! - load: нечитаемый файл = "нет предыдущего состояния", битые строки пропускаются;
//! - persist_all: ошибки I/O логируются и попадают в PersistReport, состояние в памяти
//!   НЕ откатывается.

use anyhow::{Context, Result};
use chrono::Local;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::alloc::SequenceAllocator;
use crate::config::RegistryConfig;
use crate::error::RowError;
use crate::metrics::{record_persist_failure, record_persist_pass};
use crate::store::{admit_rows, RecordStore};

use super::backup::{write_backup, PersistReason};
use super::records::{encode_records, header_only, read_records_from_path};
use super::reserved::{encode_reservations, read_reservations_from_path};
use super::write_file_atomic;

/// State recovered from disk at open.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub store: RecordStore,
    pub alloc: SequenceAllocator,
    /// Rows that failed to parse or broke an invariant.
    pub skipped: Vec<RowError>,
}

/// Outcome of one persistence pass. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistReport {
    pub reason: PersistReason,
    pub records_written: bool,
    pub reservations_written: bool,
    pub backup: Option<PathBuf>,
    pub errors: Vec<String>,
}

impl PersistReport {
    fn new(reason: PersistReason) -> Self {
        Self {
            reason,
            records_written: false,
            reservations_written: false,
            backup: None,
            errors: Vec::new(),
        }
    }

    /// Every file of the pass was written.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, what: &str, e: anyhow::Error) {
        error!("persist[{}]: {} failed: {:#}", self.reason, what, e);
        record_persist_failure();
        self.errors.push(format!("{what}: {e:#}"));
    }
}

#[derive(Debug, Clone)]
pub struct PersistenceEngine {
    records_path: PathBuf,
    reserved_path: PathBuf,
    backup_dir: PathBuf,
    backups: bool,
}

impl PersistenceEngine {
    pub fn new(cfg: &RegistryConfig) -> Self {
        Self {
            records_path: cfg.records_path(),
            reserved_path: cfg.reserved_path(),
            backup_dir: cfg.backup_root().to_path_buf(),
            backups: cfg.backups,
        }
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn reserved_path(&self) -> &Path {
        &self.reserved_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Read the canonical files into a store + allocator.
    ///
    /// Every admitted row reserves its (year, seq); the reservation file is
    /// unioned on top. Never fails: unreadable files mean an empty start.
    pub fn load(&self) -> LoadedState {
        let mut state = LoadedState::default();

        if self.records_path.exists() {
            match read_records_from_path(&self.records_path) {
                Ok(parsed) => {
                    state.skipped = parsed.errors;
                    let (accepted, rejected) = admit_rows(parsed.rows);
                    state.skipped.extend(rejected);
                    for r in &accepted {
                        state.alloc.reserve(r.year, r.seq_number);
                    }
                    state.store = RecordStore::from_registrants(accepted);
                }
                Err(e) => {
                    error!(
                        "load: cannot read {}, starting empty: {:#}",
                        self.records_path.display(),
                        e
                    );
                }
            }
        }

        if let Some(reserved) = read_reservations_from_path(&self.reserved_path) {
            state.alloc.union_reservations(&reserved);
        }

        if !state.skipped.is_empty() {
            warn!(
                "load: {} row(s) skipped in {}",
                state.skipped.len(),
                self.records_path.display()
            );
        }
        info!(
            "load: {} registrant(s), {} year(s) with reservations from {}",
            state.store.len(),
            state.alloc.years().count(),
            self.records_path.display()
        );
        state
    }

    /// Rewrite the reservation file only (after reserve_next).
    pub fn save_reservations(&self, alloc: &SequenceAllocator) -> Result<()> {
        let bytes = encode_reservations(&alloc.reservations())?;
        write_file_atomic(&self.reserved_path, &bytes)
            .with_context(|| format!("save {}", self.reserved_path.display()))
    }

    /// Rewrite both canonical files and add one backup tagged `reason`.
    pub fn persist_all(
        &self,
        store: &RecordStore,
        alloc: &SequenceAllocator,
        reason: PersistReason,
    ) -> PersistReport {
        record_persist_pass();
        let mut report = PersistReport::new(reason);

        let all = store.all_registrants();
        let committed = match encode_records(&all)
            .and_then(|bytes| write_file_atomic(&self.records_path, &bytes).map(|_| bytes))
        {
            Ok(bytes) => {
                report.records_written = true;
                Some(bytes)
            }
            Err(e) => {
                report.fail("record file", e);
                None
            }
        };

        match self.save_reservations(alloc) {
            Ok(()) => report.reservations_written = true,
            Err(e) => report.fail("reservation file", e),
        }

        if self.backups {
            // Backup of what was just committed; fall back to whatever is on disk.
            let bytes = match committed {
                Some(bytes) => Ok(bytes),
                None => self.canonical_or_header(),
            };
            match bytes.and_then(|b| {
                write_backup(&self.backup_dir, reason, &Local::now().naive_local(), &b)
            }) {
                Ok(path) => report.backup = Some(path),
                Err(e) => report.fail("backup", e),
            }
        }

        info!(
            "persist[{}]: {} registrant(s), backup={}",
            reason,
            all.len(),
            report
                .backup
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        report
    }

    /// Backup of the canonical file as it is on disk (header-only if absent).
    pub fn backup_canonical(&self, reason: PersistReason) -> Result<Option<PathBuf>> {
        if !self.backups {
            return Ok(None);
        }
        let bytes = self.canonical_or_header()?;
        let path = write_backup(&self.backup_dir, reason, &Local::now().naive_local(), &bytes)?;
        info!("backup[{}]: {}", reason, path.display());
        Ok(Some(path))
    }

    fn canonical_or_header(&self) -> Result<Vec<u8>> {
        if self.records_path.exists() {
            fs::read(&self.records_path)
                .with_context(|| format!("read {}", self.records_path.display()))
        } else {
            header_only()
        }
    }

    /// Copy the canonical files into `dir`. Missing canonical files are skipped.
    pub fn export_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let mut out = Vec::new();
        for src in [&self.records_path, &self.reserved_path] {
            if !src.exists() {
                continue;
            }
            let Some(name) = src.file_name() else {
                continue;
            };
            let dst = dir.join(name);
            fs::copy(src, &dst)
                .with_context(|| format!("copy {} -> {}", src.display(), dst.display()))?;
            out.push(dst);
        }
        info!("export: {} file(s) to {}", out.len(), dir.display());
        Ok(out)
    }
}
