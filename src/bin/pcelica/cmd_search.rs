use anyhow::Result;
use std::path::PathBuf;

use crate::util::{open_registry, print_registrants, year_or_current};

pub fn exec(data_dir: Option<PathBuf>, year: Option<i32>, query: String, json: bool) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let hits = reg.search(year_or_current(year), &query);
    print_registrants(&hits, json)
}
