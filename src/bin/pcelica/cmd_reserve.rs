use anyhow::Result;
use std::path::PathBuf;

use pcelica::format_doc_number;

use crate::util::{open_registry, year_or_current};

pub fn exec(data_dir: Option<PathBuf>, year: Option<i32>) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let year = year_or_current(year);
    let seq = reg.reserve_next(year)?;
    println!(
        "RESERVED {} for {} ({})",
        seq,
        year,
        format_doc_number(&reg.config().doc_prefix, seq, year)
    );
    Ok(())
}
