//! Typed errors surfaced to callers.
//!
//! File-level helpers return `anyhow::Result` with context; the façade wraps
//! those into `RegistryError::Io`. Validation is the only class that rejects
//! an operation before anything is applied.

use std::path::PathBuf;

/// A request that would break a store invariant. Nothing was applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("first and last name are required")]
    EmptyName,

    #[error("a registrant named {first_name} {last_name} already exists in {year}")]
    DuplicateName {
        year: i32,
        first_name: String,
        last_name: String,
    },

    #[error("registrant id already present: {0}")]
    DuplicateId(String),

    #[error("registrant id is empty")]
    EmptyId,

    #[error("sequence number {seq} is not reserved for {year}")]
    SequenceNotReserved { year: i32, seq: u32 },

    #[error("sequence number {seq} in {year} already belongs to {owner}")]
    SequenceTaken { year: i32, seq: u32, owner: String },

    #[error("no registrant {id} in {year}")]
    UnknownRegistrant { year: i32, id: String },
}

/// One row of a record file that could not be turned into a registrant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {line}: {reason}")]
pub struct RowError {
    /// 1-based line number in the file (header is line 1).
    pub line: usize,
    pub reason: String,
}

impl RowError {
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("a backup is open for viewing (read-only); discard or commit it first")]
    ReadOnlyView,

    #[error("no backup is open for viewing")]
    NotViewing,

    #[error("data directory is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
