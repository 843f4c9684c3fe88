use anyhow::Result;
use std::path::PathBuf;

use pcelica::metrics::metrics_snapshot;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    // Counters are per process: opening the registry is what gets measured.
    let _reg = open_registry(data_dir)?;
    let m = metrics_snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&m)?);
        return Ok(());
    }
    println!("numbers_reserved  = {}", m.numbers_reserved);
    println!("persist_passes    = {}", m.persist_passes);
    println!("persist_failures  = {}", m.persist_failures);
    println!("backups_written   = {}", m.backups_written);
    println!("rows_skipped      = {}", m.rows_skipped);
    Ok(())
}
