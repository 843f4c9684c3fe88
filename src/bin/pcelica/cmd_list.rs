use anyhow::Result;
use std::path::PathBuf;

use crate::util::{open_registry, print_registrants, year_or_current};

pub fn exec(data_dir: Option<PathBuf>, year: Option<i32>, json: bool) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let list = reg.registrants_for_year(year_or_current(year));
    print_registrants(&list, json)
}
