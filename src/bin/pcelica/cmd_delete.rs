use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, id: String, year: i32) -> Result<()> {
    let reg = open_registry(data_dir)?;
    if reg.delete_registrant(year, &id)? {
        println!("DELETED '{}' from {}", id, year);
    } else {
        println!("DELETE requested, but no registrant '{}' in {}", id, year);
    }
    Ok(())
}
