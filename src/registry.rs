//! Registry: high-level API over store + allocator + persistence + snapshots.
//!
//! Все мутации идут под одним Mutex: validate -> apply -> persist_all, без
//! отпускания лока между шагами. Queries take the same lock only long enough
//! to copy out what they return.
//!
//! States: Live (mutations allowed) and Viewing (a backup is open read-only;
//! every mutation returns RegistryError::ReadOnlyView until the view is
//! discarded or committed).

use chrono::{Local, NaiveDate};
use log::{error, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::alloc::SequenceAllocator;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result, RowError, ValidationError};
use crate::lock::{try_lock_data_dir, DirLock};
use crate::model::{format_doc_number, Registrant, RegistrantDraft};
use crate::persist::{list_backups, BackupEntry, PersistReason, PersistReport, PersistenceEngine};
use crate::snapshots::{BackupView, ImportOutcome, ImportPolicy, SnapshotManager};
use crate::store::RecordStore;
use crate::util::title_case;

struct Inner {
    store: RecordStore,
    alloc: SequenceAllocator,
    snapshots: SnapshotManager,
    view: Option<BackupView>,
    skipped_on_load: Vec<RowError>,
    last_report: Option<PersistReport>,
}

impl Inner {
    fn ensure_live(&self) -> Result<()> {
        if self.view.is_some() {
            return Err(RegistryError::ReadOnlyView);
        }
        Ok(())
    }
}

/// Data for the "new registrant" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prefill {
    pub draft: RegistrantDraft,
    /// Year the data was copied from, if an earlier registration exists.
    pub from_year: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStatus {
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub registrants: usize,
    pub years: Vec<i32>,
    pub viewing: Option<PathBuf>,
    pub rows_skipped_on_load: usize,
    pub last_persist_reason: Option<String>,
    pub last_backup: Option<PathBuf>,
    pub last_persist_errors: Vec<String>,
}

pub struct Registry {
    cfg: RegistryConfig,
    engine: PersistenceEngine,
    inner: Mutex<Inner>,
    /// STARTUP backup written by this open, if any.
    startup_backup: Option<PathBuf>,
    _lock: Option<DirLock>,
}

impl Registry {
    /// Open the registry in `data_dir` (other settings from PCELICA_* env).
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::open_with_config(RegistryConfig::from_env().with_data_dir(data_dir))
    }

    /// Load the canonical files, capture the baseline and write the STARTUP backup.
    pub fn open_with_config(cfg: RegistryConfig) -> Result<Self> {
        let lock = if cfg.lock {
            Some(try_lock_data_dir(&cfg.data_dir)?)
        } else {
            None
        };

        let engine = PersistenceEngine::new(&cfg);
        let loaded = engine.load();
        let snapshots = SnapshotManager::new(&loaded.store, &loaded.alloc);

        let startup_backup = match engine.backup_canonical(PersistReason::Startup) {
            Ok(path) => path,
            Err(e) => {
                error!("open: STARTUP backup failed: {:#}", e);
                None
            }
        };
        info!(
            "registry opened: {} ({} registrant(s))",
            cfg.data_dir.display(),
            loaded.store.len()
        );

        Ok(Self {
            engine,
            inner: Mutex::new(Inner {
                store: loaded.store,
                alloc: loaded.alloc,
                snapshots,
                view: None,
                skipped_on_load: loaded.skipped,
                last_report: None,
            }),
            startup_backup,
            _lock: lock,
            cfg,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, inner: &mut Inner, reason: PersistReason) -> PersistReport {
        let report = self.engine.persist_all(&inner.store, &inner.alloc, reason);
        inner.last_report = Some(report.clone());
        report
    }

    // ---------------- mutations ----------------

    /// Reserve the smallest free sequence number of `year`.
    ///
    /// Only the reservation file is rewritten; no backup is taken.
    pub fn reserve_next(&self, year: i32) -> Result<u32> {
        let mut inner = self.state();
        inner.ensure_live()?;
        let seq = inner.alloc.reserve_next(year);
        if let Err(e) = self.engine.save_reservations(&inner.alloc) {
            error!("reserve_next: cannot save reservations: {:#}", e);
        }
        Ok(seq)
    }

    /// Insert a fully numbered registrant (id, seq, doc number and year already set).
    pub fn add_registrant(&self, r: Registrant) -> Result<PersistReport> {
        let mut inner = self.state();
        inner.ensure_live()?;
        inner.store.check_add(&r, &inner.alloc)?;
        inner.store.insert(r);
        Ok(self.persist(&mut inner, PersistReason::Add))
    }

    /// Replace the editable fields of the registrant with `r.id` in `r.year`.
    /// Names are title-cased. Returns false (and persists nothing) if there is
    /// no such registrant.
    pub fn update_registrant(&self, r: &Registrant) -> Result<bool> {
        let mut r = r.clone();
        r.first_name = title_case(&r.first_name);
        r.last_name = title_case(&r.last_name);

        let mut inner = self.state();
        inner.ensure_live()?;
        let Some(idx) = inner.store.check_update(&r)? else {
            return Ok(false);
        };
        inner.store.replace_at(r.year, idx, r);
        self.persist(&mut inner, PersistReason::Edit);
        Ok(true)
    }

    /// Remove a registrant. Its sequence number stays reserved.
    pub fn delete_registrant(&self, year: i32, id: &str) -> Result<bool> {
        let mut inner = self.state();
        inner.ensure_live()?;
        let Some(removed) = inner.store.remove(year, id) else {
            return Ok(false);
        };
        info!(
            "delete: {} {} ({}), seq {} stays reserved",
            removed.first_name, removed.last_name, removed.doc_number, removed.seq_number
        );
        self.persist(&mut inner, PersistReason::Delete);
        Ok(true)
    }

    /// Create a registrant for `year` from a draft: names are title-cased,
    /// the next number is reserved and a fresh id assigned.
    ///
    /// Validation runs before the reservation, so a rejected draft does not
    /// consume a number.
    pub fn register(&self, year: i32, mut draft: RegistrantDraft) -> Result<Registrant> {
        draft.first_name = title_case(&draft.first_name);
        draft.last_name = title_case(&draft.last_name);

        let mut inner = self.state();
        inner.ensure_live()?;
        if draft.first_name.is_empty() || draft.last_name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if inner
            .store
            .exists_same_name(year, &draft.first_name, &draft.last_name)
        {
            return Err(ValidationError::DuplicateName {
                year,
                first_name: draft.first_name,
                last_name: draft.last_name,
            }
            .into());
        }

        let seq = inner.alloc.reserve_next(year);
        let mut r = Registrant {
            id: Uuid::new_v4().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            gender: draft.gender,
            birth_date: None,
            birth_place: String::new(),
            residence_city: String::new(),
            colonies: 0,
            doc_number: format_doc_number(&self.cfg.doc_prefix, seq, year),
            seq_number: seq,
            year,
            certificate_date: None,
        };
        r.apply_draft(draft);

        inner.store.check_add(&r, &inner.alloc)?;
        inner.store.insert(r.clone());
        self.persist(&mut inner, PersistReason::Add);
        info!("register: {} {} -> {}", r.first_name, r.last_name, r.doc_number);
        Ok(r)
    }

    /// Apply `draft` to registrant `id` of `year`; identity and numbering are kept.
    /// Names are title-cased the same way `register` does it.
    pub fn edit(&self, id: &str, year: i32, mut draft: RegistrantDraft) -> Result<Registrant> {
        draft.first_name = title_case(&draft.first_name);
        draft.last_name = title_case(&draft.last_name);

        let mut inner = self.state();
        inner.ensure_live()?;
        let Some(current) = inner.store.get(year, id) else {
            return Err(ValidationError::UnknownRegistrant {
                year,
                id: id.to_string(),
            }
            .into());
        };
        let mut updated = current.clone();
        updated.apply_draft(draft);

        let Some(idx) = inner.store.check_update(&updated)? else {
            return Err(ValidationError::UnknownRegistrant {
                year,
                id: id.to_string(),
            }
            .into());
        };
        inner.store.replace_at(year, idx, updated.clone());
        self.persist(&mut inner, PersistReason::Edit);
        Ok(updated)
    }

    /// Explicit save on shutdown (CLOSE).
    pub fn close(&self) -> PersistReport {
        let mut inner = self.state();
        self.persist(&mut inner, PersistReason::Close)
    }

    // ---------------- snapshots ----------------

    /// Back to the state captured at open (or at the last import).
    pub fn restore_to_baseline(&self) -> Result<PersistReport> {
        let mut inner = self.state();
        inner.ensure_live()?;
        let Inner {
            store,
            alloc,
            snapshots,
            ..
        } = &mut *inner;
        let report = snapshots.restore_to_baseline(store, alloc, &self.engine);
        inner.last_report = Some(report.clone());
        Ok(report)
    }

    /// Newest STARTUP backup written before this registry was opened.
    pub fn previous_startup_backup(&self) -> Result<Option<BackupEntry>> {
        let own = self.startup_backup.as_deref();
        Ok(self
            .list_backups()?
            .into_iter()
            .find(|b| b.reason == Some(PersistReason::Startup) && Some(b.path.as_path()) != own))
    }

    /// Back to the state the previous session started from.
    ///
    /// Each process keeps its baseline in memory only, so a fresh open has
    /// nothing to undo; this adopts the newest earlier STARTUP backup instead.
    /// Returns None when there is no such backup.
    pub fn restore_previous_startup(&self) -> Result<Option<ImportOutcome>> {
        let mut inner = self.state();
        inner.ensure_live()?;
        let Some(entry) = self.previous_startup_backup()? else {
            return Ok(None);
        };
        let Inner {
            store,
            alloc,
            snapshots,
            ..
        } = &mut *inner;
        let outcome = snapshots.restore_from_backup(&entry.path, store, alloc, &self.engine)?;
        inner.last_report = Some(outcome.report.clone());
        Ok(Some(outcome))
    }

    /// Adopt an external record file as the new main state.
    pub fn import_as_main(&self, path: &Path, policy: ImportPolicy) -> Result<ImportOutcome> {
        let mut inner = self.state();
        inner.ensure_live()?;
        self.import_locked(&mut inner, path, policy)
    }

    pub fn import_as_main_merge(&self, path: &Path) -> Result<ImportOutcome> {
        self.import_as_main(path, ImportPolicy::Merge)
    }

    pub fn import_as_main_replace(&self, path: &Path) -> Result<ImportOutcome> {
        self.import_as_main(path, ImportPolicy::Replace)
    }

    fn import_locked(
        &self,
        inner: &mut Inner,
        path: &Path,
        policy: ImportPolicy,
    ) -> Result<ImportOutcome> {
        let Inner {
            store,
            alloc,
            snapshots,
            ..
        } = &mut *inner;
        let outcome = snapshots.import_as_main(path, policy, store, alloc, &self.engine)?;
        inner.last_report = Some(outcome.report.clone());
        Ok(outcome)
    }

    // ---------------- backup view ----------------

    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        Ok(list_backups(self.engine.backup_dir())?)
    }

    /// Enter the Viewing state for `path`. Replaces a view that is already open.
    pub fn open_backup_view(&self, path: &Path) -> Result<BackupView> {
        let view = BackupView::open(path)?;
        let mut inner = self.state();
        if let Some(old) = inner.view.replace(view.clone()) {
            info!("view: replacing open view of {}", old.source().display());
        }
        Ok(view)
    }

    pub fn view(&self) -> Option<BackupView> {
        self.state().view.clone()
    }

    pub fn is_viewing(&self) -> bool {
        self.state().view.is_some()
    }

    /// Back to Live without changing anything.
    pub fn discard_view(&self) -> Result<()> {
        let mut inner = self.state();
        match inner.view.take() {
            Some(v) => {
                info!("view: discarded {}", v.source().display());
                Ok(())
            }
            None => Err(RegistryError::NotViewing),
        }
    }

    /// Import the viewed backup as main and return to Live.
    /// On failure the view stays open and the live state is unchanged.
    pub fn commit_view(&self, policy: ImportPolicy) -> Result<ImportOutcome> {
        let mut inner = self.state();
        let Some(source) = inner.view.as_ref().map(|v| v.source().to_path_buf()) else {
            return Err(RegistryError::NotViewing);
        };
        let outcome = self.import_locked(&mut inner, &source, policy)?;
        inner.view = None;
        Ok(outcome)
    }

    // ---------------- queries ----------------

    pub fn registrants_for_year(&self, year: i32) -> Vec<Registrant> {
        self.state().store.registrants_for_year(year)
    }

    pub fn all_registrants(&self) -> Vec<Registrant> {
        self.state().store.all_registrants()
    }

    pub fn find(&self, id: &str) -> Option<Registrant> {
        self.state().store.find_by_id(id).cloned()
    }

    pub fn exists_same_name(&self, year: i32, first_name: &str, last_name: &str) -> bool {
        self.state()
            .store
            .exists_same_name(year, first_name, last_name)
    }

    pub fn latest_registrant_before(
        &self,
        first_name: &str,
        last_name: &str,
        year: i32,
    ) -> Option<Registrant> {
        self.state()
            .store
            .latest_registrant_before(first_name, last_name, year)
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.state().store.years()
    }

    pub fn search(&self, year: i32, query: &str) -> Vec<Registrant> {
        self.state().store.search(year, query)
    }

    pub fn reserved_set(&self, year: i32) -> BTreeSet<u32> {
        self.state().alloc.reserved_set(year)
    }

    /// Starting values for a new registrant of `year` named (first, last).
    ///
    /// Copies the latest earlier registration when there is one; otherwise the
    /// certificate date defaults to that of the last registrant of `year`, or today.
    pub fn prefill(&self, first_name: &str, last_name: &str, year: i32) -> Result<Prefill> {
        let first = title_case(first_name);
        let last = title_case(last_name);
        if first.is_empty() || last.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let inner = self.state();
        if inner.store.exists_same_name(year, &first, &last) {
            return Err(ValidationError::DuplicateName {
                year,
                first_name: first,
                last_name: last,
            }
            .into());
        }

        if let Some(prev) = inner.store.latest_registrant_before(&first, &last, year) {
            return Ok(Prefill {
                draft: prev.to_draft(),
                from_year: Some(prev.year),
            });
        }

        let mut draft = RegistrantDraft::new(first, last);
        draft.certificate_date = default_certificate_date(&inner.store, year);
        Ok(Prefill {
            draft,
            from_year: None,
        })
    }

    pub fn status(&self) -> RegistryStatus {
        let inner = self.state();
        RegistryStatus {
            data_dir: self.cfg.data_dir.clone(),
            backup_dir: self.engine.backup_dir().to_path_buf(),
            registrants: inner.store.len(),
            years: inner.store.years().into_iter().collect(),
            viewing: inner.view.as_ref().map(|v| v.source().to_path_buf()),
            rows_skipped_on_load: inner.skipped_on_load.len(),
            last_persist_reason: inner.last_report.as_ref().map(|r| r.reason.to_string()),
            last_backup: inner.last_report.as_ref().and_then(|r| r.backup.clone()),
            last_persist_errors: inner
                .last_report
                .as_ref()
                .map(|r| r.errors.clone())
                .unwrap_or_default(),
        }
    }

    /// Rows dropped while loading the canonical file.
    pub fn skipped_on_load(&self) -> Vec<RowError> {
        self.state().skipped_on_load.clone()
    }

    /// Copy the canonical files to `dir`.
    pub fn export_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        // hold the lock so no persistence pass runs mid-copy
        let _inner = self.state();
        Ok(self.engine.export_to(dir)?)
    }
}

fn default_certificate_date(store: &RecordStore, year: i32) -> Option<NaiveDate> {
    match store.registrants_for_year(year).last() {
        Some(last) => last.certificate_date,
        None => Some(Local::now().date_naive()),
    }
}
