use anyhow::{anyhow, Result};
use std::path::PathBuf;

use crate::cli::FieldArgs;
use crate::util::{apply_fields, open_registry};

pub fn exec(
    data_dir: Option<PathBuf>,
    id: String,
    year: i32,
    first: Option<String>,
    last: Option<String>,
    fields: FieldArgs,
) -> Result<()> {
    let reg = open_registry(data_dir)?;
    let current = reg
        .registrants_for_year(year)
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("no registrant {} in {}", id, year))?;

    let mut draft = current.to_draft();
    if let Some(f) = first {
        draft.first_name = f;
    }
    if let Some(l) = last {
        draft.last_name = l;
    }
    apply_fields(&mut draft, &fields)?;

    let r = reg.edit(&id, year, draft)?;
    println!("EDITED {} {} ({})", r.first_name, r.last_name, r.doc_number);
    Ok(())
}
