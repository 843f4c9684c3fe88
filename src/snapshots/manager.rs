//! SnapshotManager: baseline restore and "adopt this file as main" imports.
//!
//! Import, обе политики:
//! 1) parse the file (bad rows skipped), admit rows against the store invariants;
//! 2) replace every partition with exactly the admitted list;
//! 3) reservations: Merge = union (nothing freed), Replace = overwrite (may free);
//! 4) re-capture the baseline, persist (IMPORT / IMPORT_REPLACE).
//!
//! Step 1 is the only fallible step; on error nothing has been touched.

use anyhow::Result;
use log::info;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::baseline::Baseline;
use crate::alloc::{Reservations, SequenceAllocator};
use crate::error::RowError;
use crate::persist::{read_records_from_path, PersistReason, PersistReport, PersistenceEngine};
use crate::store::{admit_rows, RecordStore};

/// How an import treats the reservation registry. Partitions are replaced either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPolicy {
    /// Union the file's (year, seq) pairs into the registry.
    #[default]
    Merge,
    /// The registry becomes exactly the file's (year, seq) pairs.
    Replace,
}

impl ImportPolicy {
    pub fn reason(self) -> PersistReason {
        match self {
            ImportPolicy::Merge => PersistReason::Import,
            ImportPolicy::Replace => PersistReason::ImportReplace,
        }
    }
}

impl fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportPolicy::Merge => f.write_str("merge"),
            ImportPolicy::Replace => f.write_str("replace"),
        }
    }
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" | "union" => Ok(ImportPolicy::Merge),
            "replace" => Ok(ImportPolicy::Replace),
            other => Err(format!("unknown import policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub policy: ImportPolicy,
    pub imported: usize,
    /// Bad rows plus rows rejected by the store invariants.
    pub skipped: Vec<RowError>,
    pub report: PersistReport,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotManager {
    baseline: Baseline,
}

impl SnapshotManager {
    /// Start with the state as loaded.
    pub fn new(store: &RecordStore, alloc: &SequenceAllocator) -> Self {
        Self {
            baseline: Baseline::capture(store, alloc),
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Put the live state back to the baseline and persist (RESTORE_STARTUP).
    pub fn restore_to_baseline(
        &self,
        store: &mut RecordStore,
        alloc: &mut SequenceAllocator,
        engine: &PersistenceEngine,
    ) -> PersistReport {
        self.baseline.restore_into(store, alloc);
        info!(
            "snapshot: restored baseline ({} registrant(s))",
            self.baseline.registrants().len()
        );
        engine.persist_all(store, alloc, PersistReason::RestoreStartup)
    }

    /// Adopt `path` as the new main state.
    pub fn import_as_main(
        &mut self,
        path: &Path,
        policy: ImportPolicy,
        store: &mut RecordStore,
        alloc: &mut SequenceAllocator,
        engine: &PersistenceEngine,
    ) -> Result<ImportOutcome> {
        self.adopt(path, policy, policy.reason(), store, alloc, engine)
    }

    /// Adopt a STARTUP backup written by an earlier session (RESTORE_STARTUP).
    ///
    /// The backup carries records only, so reservations are merged: numbers
    /// reserved since then stay taken.
    pub fn restore_from_backup(
        &mut self,
        path: &Path,
        store: &mut RecordStore,
        alloc: &mut SequenceAllocator,
        engine: &PersistenceEngine,
    ) -> Result<ImportOutcome> {
        self.adopt(
            path,
            ImportPolicy::Merge,
            PersistReason::RestoreStartup,
            store,
            alloc,
            engine,
        )
    }

    fn adopt(
        &mut self,
        path: &Path,
        policy: ImportPolicy,
        reason: PersistReason,
        store: &mut RecordStore,
        alloc: &mut SequenceAllocator,
        engine: &PersistenceEngine,
    ) -> Result<ImportOutcome> {
        let parsed = read_records_from_path(path)?;
        let mut skipped = parsed.errors;
        let (accepted, rejected) = admit_rows(parsed.rows);
        skipped.extend(rejected);

        let mut from_file = Reservations::new();
        for r in &accepted {
            from_file.entry(r.year).or_default().insert(r.seq_number);
        }

        let imported = accepted.len();
        store.replace_all(accepted);
        match policy {
            ImportPolicy::Merge => alloc.union_reservations(&from_file),
            ImportPolicy::Replace => alloc.replace_reservations(from_file),
        }
        self.baseline = Baseline::capture(store, alloc);

        info!(
            "snapshot: adopted {} as main ({}, {}, {} registrant(s), {} skipped)",
            path.display(),
            reason,
            policy,
            imported,
            skipped.len()
        );
        let report = engine.persist_all(store, alloc, reason);
        Ok(ImportOutcome {
            policy,
            imported,
            skipped,
            report,
        })
    }
}
