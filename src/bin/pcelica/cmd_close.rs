use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let report = reg.close();
    if !report.is_clean() {
        return Err(anyhow!("close: {}", report.errors.join("; ")));
    }
    println!(
        "SAVED ({})",
        report
            .backup
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "no backup".into())
    );
    Ok(())
}
