use anyhow::{anyhow, Result};
use std::path::PathBuf;

use pcelica::ImportPolicy;

use crate::util::{open_registry, print_registrants};

pub fn exec(
    data_dir: Option<PathBuf>,
    file: PathBuf,
    year: Option<i32>,
    query: Option<String>,
    commit: Option<String>,
    json: bool,
) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let view = reg.open_backup_view(&file)?;

    for e in view.skipped() {
        eprintln!("skipped {}", e);
    }
    let years: Vec<i32> = match year {
        Some(y) => vec![y],
        None => view.years().into_iter().collect(),
    };
    let mut shown = Vec::new();
    for y in years {
        match &query {
            Some(q) => shown.extend(view.search(y, q)),
            None => shown.extend(view.registrants_for_year(y)),
        }
    }
    print_registrants(&shown, json)?;

    match commit {
        Some(p) => {
            let policy: ImportPolicy = p.parse().map_err(|e: String| anyhow!(e))?;
            let out = reg.commit_view(policy)?;
            println!(
                "COMMITTED {} as main ({}, {} registrant(s), {} skipped)",
                file.display(),
                out.policy,
                out.imported,
                out.skipped.len()
            );
        }
        None => reg.discard_view()?,
    }
    Ok(())
}
