use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::path::PathBuf;

use pcelica::consts::DATE_FORMAT;
use pcelica::{Gender, Registrant, RegistrantDraft, Registry, RegistryConfig};

use crate::cli::FieldArgs;

pub fn open_registry(data_dir: Option<PathBuf>) -> Result<Registry> {
    let mut cfg = RegistryConfig::from_env();
    if let Some(dir) = data_dir {
        cfg = cfg.with_data_dir(dir);
    }
    Ok(Registry::open_with_config(cfg)?)
}

pub fn year_or_current(year: Option<i32>) -> i32 {
    year.unwrap_or_else(|| Local::now().year())
}

pub fn parse_date_arg(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| anyhow!("bad date '{}' (expected yyyy-mm-dd): {}", s, e))
}

/// Overlay the flags that were given onto `draft`.
pub fn apply_fields(draft: &mut RegistrantDraft, f: &FieldArgs) -> Result<()> {
    if let Some(g) = &f.gender {
        draft.gender = g.parse::<Gender>().map_err(|e| anyhow!(e))?;
    }
    if let Some(d) = &f.birth_date {
        draft.birth_date = Some(parse_date_arg(d)?);
    }
    if let Some(p) = &f.birth_place {
        draft.birth_place = p.clone();
    }
    if let Some(c) = &f.city {
        draft.residence_city = c.clone();
    }
    if let Some(n) = f.colonies {
        draft.colonies = n;
    }
    if let Some(d) = &f.cert_date {
        draft.certificate_date = if d.trim() == "-" {
            None
        } else {
            Some(parse_date_arg(d)?)
        };
    }
    Ok(())
}

fn fmt_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%d.%m.%Y.").to_string()).unwrap_or_default()
}

pub fn print_registrants(list: &[Registrant], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(list)?);
        return Ok(());
    }
    println!(
        "{:<9} {:<16} {:<18} {:<7} {:<12} {:<14} {:<14} {:>5} {:<12} id",
        "doc", "first", "last", "gender", "born", "birth place", "city", "col.", "certificate"
    );
    for r in list {
        println!(
            "{:<9} {:<16} {:<18} {:<7} {:<12} {:<14} {:<14} {:>5} {:<12} {}",
            r.doc_number,
            r.first_name,
            r.last_name,
            r.gender.label(),
            fmt_date(r.birth_date),
            r.birth_place,
            r.residence_city,
            r.colonies,
            fmt_date(r.certificate_date),
            r.id
        );
    }
    println!("({} registrant(s))", list.len());
    Ok(())
}
