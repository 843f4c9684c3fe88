use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let st = reg.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&st)?);
        return Ok(());
    }

    println!("Registry status:");
    println!("  data_dir           = {}", st.data_dir.display());
    println!("  backup_dir         = {}", st.backup_dir.display());
    println!("  registrants        = {}", st.registrants);
    println!(
        "  years              = {}",
        st.years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  rows skipped (load)= {}", st.rows_skipped_on_load);
    for e in reg.skipped_on_load() {
        println!("    {}", e);
    }
    for y in &st.years {
        let reserved = reg.reserved_set(*y);
        println!(
            "  reserved[{}]      = {} (max {})",
            y,
            reserved.len(),
            reserved.iter().next_back().copied().unwrap_or(0)
        );
    }
    Ok(())
}
