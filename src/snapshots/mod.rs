//! Snapshots: the restore target captured at load, imports that adopt an
//! external record file as the new main state, and read-only backup views.
//!
//! - baseline.rs: Baseline (deep copy of registrants + reservations).
//! - manager.rs:  SnapshotManager (restore_to_baseline, import_as_main).
//! - view.rs:     BackupView (parsed backup file, inspected without touching the store).

mod baseline;
mod manager;
mod view;

pub use baseline::Baseline;
pub use manager::{ImportOutcome, ImportPolicy, SnapshotManager};
pub use view::BackupView;
