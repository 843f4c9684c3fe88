// Базовые модули
pub mod consts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod lock;

// Модель и ядро (папки с mod.rs)
pub mod model;     // src/model/{mod,registrant,doc_number}.rs
pub mod alloc;
pub mod store;     // src/store/{mod,core,query}.rs
pub mod persist;   // src/persist/{mod,records,reserved,backup,engine}.rs
pub mod snapshots; // src/snapshots/{mod,baseline,manager,view}.rs

// High-level API
pub mod registry;

// Утилиты (same_name, title_case, fold_for_search)
pub mod util;      // src/util/mod.rs

// Удобные реэкспорты
pub use alloc::{Reservations, SequenceAllocator};
pub use config::{RegistryBuilder, RegistryConfig};
pub use error::{RegistryError, Result, RowError, ValidationError};
pub use model::{format_doc_number, Gender, Registrant, RegistrantDraft};
pub use persist::{BackupEntry, PersistReason, PersistReport, PersistenceEngine};
pub use registry::{Prefill, Registry, RegistryStatus};
pub use snapshots::{BackupView, ImportOutcome, ImportPolicy, SnapshotManager};
pub use store::RecordStore;
