//! Lightweight global metrics for the registry.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Allocator (выданные номера)
//! - Persistence (проходы, ошибки записи, бэкапы)
//! - Parsing (пропущенные строки CSV)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Allocator -----
static NUMBERS_RESERVED: AtomicU64 = AtomicU64::new(0);

// ----- Persistence -----
static PERSIST_PASSES: AtomicU64 = AtomicU64::new(0);
static PERSIST_FAILURES: AtomicU64 = AtomicU64::new(0);
static BACKUPS_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- Parsing -----
static ROWS_SKIPPED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub numbers_reserved: u64,
    pub persist_passes: u64,
    pub persist_failures: u64,
    pub backups_written: u64,
    pub rows_skipped: u64,
}

#[inline]
pub fn record_number_reserved() {
    NUMBERS_RESERVED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_persist_pass() {
    PERSIST_PASSES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_persist_failure() {
    PERSIST_FAILURES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_backup_written() {
    BACKUPS_WRITTEN.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_rows_skipped(n: usize) {
    ROWS_SKIPPED.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn metrics_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        numbers_reserved: NUMBERS_RESERVED.load(Ordering::Relaxed),
        persist_passes: PERSIST_PASSES.load(Ordering::Relaxed),
        persist_failures: PERSIST_FAILURES.load(Ordering::Relaxed),
        backups_written: BACKUPS_WRITTEN.load(Ordering::Relaxed),
        rows_skipped: ROWS_SKIPPED.load(Ordering::Relaxed),
    }
}
