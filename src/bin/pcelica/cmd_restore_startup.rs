use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let Some(out) = reg.restore_previous_startup()? else {
        println!("NOTHING to restore: no earlier STARTUP backup");
        return Ok(());
    };
    println!(
        "RESTORED startup state ({} registrant(s), {} skipped), backup: {}",
        out.imported,
        out.skipped.len(),
        out.report
            .backup
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".into())
    );
    Ok(())
}
