//! Общие константы форматов (record file, reservation file, backups).

// -------- Data directory layout --------
pub const DEFAULT_DATA_DIR: &str = "data";
pub const RECORDS_FILE: &str = "store.csv";
pub const RESERVED_FILE: &str = "reserved_numbers.json";
pub const LOCK_FILE: &str = "LOCK";

// -------- Record file (CSV) --------
// Column order is fixed; older files may lack the trailing certificateDate column.
pub const RECORD_HEADER: [&str; 12] = [
    "id",
    "firstName",
    "lastName",
    "gender",
    "birthDate",
    "birthPlace",
    "residenceCity",
    "colonies",
    "docNumber",
    "seqNumber",
    "year",
    "certificateDate",
];
pub const RECORD_MIN_COLUMNS: usize = 11;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// -------- Backups --------
// backup_<yyyyMMdd_HHmmss>_<REASON>[-<n>].csv
pub const BACKUP_PREFIX: &str = "backup_";
pub const BACKUP_EXT: &str = ".csv";
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const BACKUP_STAMP_LEN: usize = 15;

// -------- Document numbers --------
pub const DEFAULT_DOC_PREFIX: &str = "14";
