//! store: authoritative year-partitioned collection of registrants.
//!
//! - core.rs: RecordStore (partitions, validated insert/replace/remove, admission of parsed rows).
//! - query.rs: read-only queries (per-year copies, name lookups, years, search).
//!
//! The store never touches disk; the Registry façade runs a persistence pass
//! after every successful mutation.

mod core;
mod query;

pub use self::core::{admit_rows, RecordStore};
pub use self::query::search_in;
