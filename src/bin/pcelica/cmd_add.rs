use anyhow::Result;
use std::path::PathBuf;

use crate::cli::FieldArgs;
use crate::util::{apply_fields, open_registry, year_or_current};

pub fn exec(
    data_dir: Option<PathBuf>,
    year: Option<i32>,
    first: String,
    last: String,
    fields: FieldArgs,
    json: bool,
) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let year = year_or_current(year);

    let prefill = reg.prefill(&first, &last, year)?;
    if let Some(from) = prefill.from_year {
        eprintln!("using data from {} registration", from);
    }
    let mut draft = prefill.draft;
    apply_fields(&mut draft, &fields)?;

    let r = reg.register(year, draft)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&r)?);
    } else {
        println!("ADDED {} {} -> {} (id {})", r.first_name, r.last_name, r.doc_number, r.id);
    }
    Ok(())
}
