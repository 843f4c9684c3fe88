//! BackupView: a backup file opened for inspection.
//!
//! The view owns its own parsed copy; nothing here touches the live store or
//! the baseline. Rows go through the same admission as an import, so the view
//! shows exactly what a commit would adopt. Commit goes through
//! SnapshotManager::import_as_main.

use anyhow::Result;
use log::info;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::RowError;
use crate::model::Registrant;
use crate::persist::read_records_from_path;
use crate::store::{admit_rows, search_in};

#[derive(Debug, Clone)]
pub struct BackupView {
    source: PathBuf,
    registrants: Vec<Registrant>,
    skipped: Vec<RowError>,
}

impl BackupView {
    pub fn open(path: &Path) -> Result<Self> {
        let parsed = read_records_from_path(path)?;
        let mut skipped = parsed.errors;
        let (registrants, rejected) = admit_rows(parsed.rows);
        skipped.extend(rejected);
        info!(
            "view: opened {} ({} registrant(s), {} skipped row(s))",
            path.display(),
            registrants.len(),
            skipped.len()
        );
        Ok(Self {
            source: path.to_path_buf(),
            registrants,
            skipped,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn skipped(&self) -> &[RowError] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.registrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrants.is_empty()
    }

    pub fn registrants_for_year(&self, year: i32) -> Vec<Registrant> {
        self.registrants
            .iter()
            .filter(|r| r.year == year)
            .cloned()
            .collect()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.registrants.iter().map(|r| r.year).collect()
    }

    pub fn search(&self, year: i32, query: &str) -> Vec<Registrant> {
        search_in(&self.registrants_for_year(year), query)
    }
}
