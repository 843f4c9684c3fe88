use anyhow::Result;
use std::path::PathBuf;

use pcelica::ImportPolicy;

use crate::util::open_registry;

pub fn exec(data_dir: Option<PathBuf>, file: PathBuf, replace: bool) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let policy = if replace {
        ImportPolicy::Replace
    } else {
        ImportPolicy::Merge
    };
    let out = reg.import_as_main(&file, policy)?;
    for e in &out.skipped {
        eprintln!("skipped {}", e);
    }
    println!(
        "IMPORTED {} ({}): {} registrant(s), {} skipped",
        file.display(),
        out.policy,
        out.imported,
        out.skipped.len()
    );
    if !out.report.is_clean() {
        for e in &out.report.errors {
            eprintln!("persist error: {}", e);
        }
    }
    Ok(())
}
