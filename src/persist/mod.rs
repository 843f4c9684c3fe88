//! persist: durable files of the registry.
//!
//! - records.rs:  canonical record file (CSV, fixed column order) encode/decode.
//! - reserved.rs: reservation registry file (JSON {"2023":[1,2,3]}).
//! - backup.rs:   reason-tagged, timestamped backup copies + catalog.
//! - engine.rs:   PersistenceEngine (load on start, persist_all after every mutation).
//!
//! Canonical files are rewritten whole via tmp+rename; backups are created with
//! create_new and are never overwritten.

pub mod backup;
pub mod records;
pub mod reserved;

mod engine;

pub use backup::{list_backups, BackupEntry, PersistReason};
pub use engine::{LoadedState, PersistReport, PersistenceEngine};
pub use records::{read_records_from_path, ParsedRecords};

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

fn tmp_path_of(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Replace `path` with `bytes` through `<path>.tmp` + rename.
pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let tmp = tmp_path_of(path);

    let mut f = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp)
        .with_context(|| format!("open {}", tmp.display()))?;
    f.write_all(bytes)
        .with_context(|| format!("write {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("sync {}", tmp.display()))?;
    drop(f);

    fs::rename(&tmp, path).with_context(|| {
        let _ = fs::remove_file(&tmp);
        format!("rename {} -> {}", tmp.display(), path.display())
    })?;
    Ok(())
}
