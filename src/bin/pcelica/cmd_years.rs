use anyhow::Result;
use std::path::PathBuf;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let years = reg.years();
    if json {
        println!("{}", serde_json::to_string(&years)?);
    } else {
        for y in years {
            println!("{} ({} registrant(s))", y, reg.registrants_for_year(y).len());
        }
    }
    Ok(())
}
