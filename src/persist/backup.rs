//! Reason-tagged backups of the canonical record file.
//!
//! Имя файла: backup_<yyyyMMdd_HHmmss>_<REASON>.csv
//! If that name is already taken (two mutations in the same second) the next
//! free `backup_<ts>_<REASON>-<n>.csv` (n >= 2) is used. Backups are created
//! with create_new: an existing backup is never overwritten or removed.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Weekday};
use log::debug;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::consts::{BACKUP_EXT, BACKUP_PREFIX, BACKUP_STAMP_FORMAT, BACKUP_STAMP_LEN};
use crate::metrics::record_backup_written;

/// Why a persistence pass (and its backup) happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistReason {
    Add,
    Edit,
    Delete,
    Close,
    Startup,
    Import,
    ImportReplace,
    RestoreStartup,
}

impl PersistReason {
    pub const ALL: [PersistReason; 8] = [
        PersistReason::Add,
        PersistReason::Edit,
        PersistReason::Delete,
        PersistReason::Close,
        PersistReason::Startup,
        PersistReason::Import,
        PersistReason::ImportReplace,
        PersistReason::RestoreStartup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersistReason::Add => "ADD",
            PersistReason::Edit => "EDIT",
            PersistReason::Delete => "DELETE",
            PersistReason::Close => "CLOSE",
            PersistReason::Startup => "STARTUP",
            PersistReason::Import => "IMPORT",
            PersistReason::ImportReplace => "IMPORT_REPLACE",
            PersistReason::RestoreStartup => "RESTORE_STARTUP",
        }
    }

    /// Human-readable description for backup pickers.
    pub fn describe(self) -> &'static str {
        match self {
            PersistReason::Add => "after adding a registrant",
            PersistReason::Edit => "after editing a registrant",
            PersistReason::Delete => "after deleting a registrant",
            PersistReason::Close => "on application close",
            PersistReason::Startup => "on application start",
            PersistReason::Import => "snapshot import (reservations merged)",
            PersistReason::ImportReplace => "snapshot import (reservations replaced)",
            PersistReason::RestoreStartup => "restore to startup state",
        }
    }
}

impl fmt::Display for PersistReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let up = s.trim().to_ascii_uppercase();
        PersistReason::ALL
            .into_iter()
            .find(|r| r.as_str() == up)
            .ok_or_else(|| format!("unknown backup reason '{}'", s))
    }
}

/// `backup_<stamp>_<REASON>.csv`, or `..._<REASON>-<n>.csv` for n >= 2.
pub fn backup_file_name(stamp: &NaiveDateTime, reason: PersistReason, n: u32) -> String {
    let ts = stamp.format(BACKUP_STAMP_FORMAT);
    if n <= 1 {
        format!("{BACKUP_PREFIX}{ts}_{}{BACKUP_EXT}", reason.as_str())
    } else {
        format!("{BACKUP_PREFIX}{ts}_{}-{n}{BACKUP_EXT}", reason.as_str())
    }
}

/// Write `bytes` as a new backup in `dir`. Never overwrites an existing file.
pub fn write_backup(
    dir: &Path,
    reason: PersistReason,
    stamp: &NaiveDateTime,
    bytes: &[u8],
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create backup dir {}", dir.display()))?;
    let mut n = 1u32;
    loop {
        let path = dir.join(backup_file_name(stamp, reason, n));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                f.write_all(bytes)
                    .with_context(|| format!("write backup {}", path.display()))?;
                f.sync_all()
                    .with_context(|| format!("sync backup {}", path.display()))?;
                record_backup_written();
                debug!("backup: wrote {} ({} bytes)", path.display(), bytes.len());
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                n += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("create backup {}", path.display()));
            }
        }
    }
}

/// One file of the backup catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub file_name: String,
    /// None if the name does not follow the backup pattern.
    pub timestamp: Option<NaiveDateTime>,
    /// Raw reason tag from the name ("ADD", "IMPORT_REPLACE", ...).
    pub reason_tag: Option<String>,
    pub reason: Option<PersistReason>,
    pub ordinal: u32,
}

impl BackupEntry {
    fn from_path(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_string();
        if !file_name.starts_with(BACKUP_PREFIX) || !file_name.ends_with(BACKUP_EXT) {
            return None;
        }
        let parsed = parse_backup_name(&file_name);
        Some(Self {
            timestamp: parsed.as_ref().map(|p| p.0),
            reason_tag: parsed.as_ref().map(|p| p.1.clone()),
            reason: parsed.as_ref().and_then(|p| p.1.parse().ok()),
            ordinal: parsed.as_ref().map(|p| p.2).unwrap_or(1),
            path,
            file_name,
        })
    }

    /// "19.10.2026. 14:03:11 (Monday) - after adding a registrant"; file name if unparseable.
    pub fn label(&self) -> String {
        let Some(ts) = self.timestamp else {
            return self.file_name.clone();
        };
        let why = match (self.reason, self.reason_tag.as_deref()) {
            (Some(r), _) => r.describe().to_string(),
            (None, Some(tag)) => tag.to_lowercase(),
            (None, None) => "unknown".to_string(),
        };
        format!(
            "{} ({}) - {}",
            ts.format("%d.%m.%Y. %H:%M:%S"),
            weekday_name(ts.weekday()),
            why
        )
    }
}

fn weekday_name(d: Weekday) -> &'static str {
    match d {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Split `backup_<stamp>_<REASON>[-<n>].csv` into (timestamp, reason tag, n).
pub fn parse_backup_name(name: &str) -> Option<(NaiveDateTime, String, u32)> {
    let core = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(BACKUP_EXT)?;
    if core.len() <= BACKUP_STAMP_LEN + 1 || !core.is_char_boundary(BACKUP_STAMP_LEN) {
        return None;
    }
    let (stamp, rest) = core.split_at(BACKUP_STAMP_LEN);
    let ts = NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).ok()?;
    let tail = rest.strip_prefix('_')?;
    let (tag, n) = match tail.rsplit_once('-') {
        Some((tag, n)) => (tag, n.parse::<u32>().ok()?),
        None => (tail, 1),
    };
    if tag.is_empty() {
        return None;
    }
    Some((ts, tag.to_string(), n))
}

/// All backup_*.csv files in `dir`, newest first. A missing dir is an empty catalog.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry.with_context(|| format!("read dir entry in {}", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if let Some(b) = BackupEntry::from_path(entry.path()) {
            out.push(b);
        }
    }
    // newest first; unparseable names sink to the end
    out.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then(b.ordinal.cmp(&a.ordinal))
            .then(b.file_name.cmp(&a.file_name))
    });
    Ok(out)
}
