use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, json: bool, limit: Option<usize>) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let mut list = reg.list_backups()?;
    if let Some(n) = limit {
        list.truncate(n);
    }

    if json {
        let arr: Vec<_> = list
            .iter()
            .map(|b| {
                json!({
                    "file": b.file_name,
                    "path": b.path,
                    "timestamp": b.timestamp.map(|t| t.to_string()),
                    "reason": b.reason_tag,
                    "label": b.label(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&arr)?);
        return Ok(());
    }

    for b in &list {
        println!("{:<48} {}", b.file_name, b.label());
    }
    println!("({} backup(s) in {})", list.len(), reg.status().backup_dir.display());
    Ok(())
}
