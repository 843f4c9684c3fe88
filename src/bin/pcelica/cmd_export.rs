use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, out: PathBuf) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let files = reg.export_to(&out)?;
    for f in &files {
        println!("EXPORTED {}", f.display());
    }
    if files.is_empty() {
        println!("nothing to export yet");
    }
    Ok(())
}
