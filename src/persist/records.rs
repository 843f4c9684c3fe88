//! Canonical record file: one header row + one row per registrant.
//!
//! Columns (fixed order):
//! id, firstName, lastName, gender, birthDate, birthPlace, residenceCity,
//! colonies, docNumber, seqNumber, year, certificateDate
//!
//! Dates are yyyy-MM-dd. Files written before certificateDate existed have 11
//! columns; the missing cell reads as "no certificate date".

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::warn;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::consts::{DATE_FORMAT, RECORD_HEADER, RECORD_MIN_COLUMNS};
use crate::error::RowError;
use crate::metrics::record_rows_skipped;
use crate::model::{Gender, Registrant};

/// Result of reading a record file: good rows with their line numbers, and the rest.
#[derive(Debug, Default)]
pub struct ParsedRecords {
    pub rows: Vec<(usize, Registrant)>,
    pub errors: Vec<RowError>,
}

fn parse_date(cell: &str, column: &str) -> Result<Option<NaiveDate>, String> {
    let s = cell.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map(Some)
        .map_err(|e| format!("{column}: bad date '{s}': {e}"))
}

fn parse_num<T: std::str::FromStr>(cell: &str, column: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let s = cell.trim();
    s.parse::<T>()
        .map_err(|e| format!("{column}: bad number '{s}': {e}"))
}

/// Turn one CSV record into a registrant.
pub fn parse_row(line: usize, rec: &StringRecord) -> Result<Registrant, RowError> {
    if rec.len() < RECORD_MIN_COLUMNS {
        return Err(RowError::new(
            line,
            format!("expected at least {} columns, got {}", RECORD_MIN_COLUMNS, rec.len()),
        ));
    }
    let cell = |i: usize| rec.get(i).unwrap_or("");
    let parsed = (|| -> Result<Registrant, String> {
        Ok(Registrant {
            id: cell(0).trim().to_string(),
            first_name: cell(1).to_string(),
            last_name: cell(2).to_string(),
            gender: cell(3).parse::<Gender>()?,
            birth_date: parse_date(cell(4), "birthDate")?,
            birth_place: cell(5).to_string(),
            residence_city: cell(6).to_string(),
            colonies: parse_num(cell(7), "colonies")?,
            doc_number: cell(8).to_string(),
            seq_number: parse_num(cell(9), "seqNumber")?,
            year: parse_num(cell(10), "year")?,
            certificate_date: parse_date(cell(11), "certificateDate")?,
        })
    })();
    let r = parsed.map_err(|reason| RowError::new(line, reason))?;
    if r.id.is_empty() {
        return Err(RowError::new(line, "empty id"));
    }
    Ok(r)
}

/// Parse a whole record file. Row-level failures are collected, not fatal.
pub fn read_records(reader: impl Read) -> ParsedRecords {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut out = ParsedRecords::default();
    for (idx, rec) in rdr.records().enumerate() {
        // header is line 1
        let fallback_line = idx + 2;
        match rec {
            Ok(rec) => {
                let line = rec
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                match parse_row(line, &rec) {
                    Ok(r) => out.rows.push((line, r)),
                    Err(e) => out.errors.push(e),
                }
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                out.errors.push(RowError::new(line, e.to_string()));
            }
        }
    }

    for e in &out.errors {
        warn!("records: skip {}", e);
    }
    record_rows_skipped(out.errors.len());
    out
}

pub fn read_records_from_path(path: &Path) -> Result<ParsedRecords> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(read_records(bytes.as_slice()))
}

fn fmt_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

/// Serialize registrants (header first) into the canonical byte form.
pub fn encode_records<'a>(registrants: impl IntoIterator<Item = &'a Registrant>) -> Result<Vec<u8>> {
    let mut w = WriterBuilder::new().from_writer(Vec::new());
    w.write_record(RECORD_HEADER).context("write header")?;
    for r in registrants {
        w.write_record([
            r.id.as_str(),
            r.first_name.as_str(),
            r.last_name.as_str(),
            r.gender.label(),
            fmt_date(r.birth_date).as_str(),
            r.birth_place.as_str(),
            r.residence_city.as_str(),
            r.colonies.to_string().as_str(),
            r.doc_number.as_str(),
            r.seq_number.to_string().as_str(),
            r.year.to_string().as_str(),
            fmt_date(r.certificate_date).as_str(),
        ])
        .with_context(|| format!("write row {}", r.id))?;
    }
    w.into_inner()
        .map_err(|e| anyhow!("flush csv buffer: {}", e.error()))
}

/// Header-only record file (used when a backup has no canonical file to copy).
pub fn header_only() -> Result<Vec<u8>> {
    encode_records(std::iter::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,firstName,lastName,gender,birthDate,birthPlace,residenceCity,colonies,docNumber,seqNumber,year,certificateDate\n";

    #[test]
    fn eleven_column_rows_have_no_certificate_date() {
        let data = "\"id\",\"firstName\",\"lastName\",\"gender\",\"birthDate\",\"birthPlace\",\"residenceCity\",\"colonies\",\"docNumber\",\"seqNumber\",\"year\"\n\
                    \"u1\",\"Hasan\",\"Hasić\",\"Muško\",\"1970-05-01\",\"Srebrenik\",\"Tuzla\",\"25\",\"14-01/23\",\"1\",\"2023\"\n";
        let parsed = read_records(data.as_bytes());
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let (line, r) = &parsed.rows[0];
        assert_eq!(*line, 2);
        assert_eq!(r.first_name, "Hasan");
        assert_eq!(r.gender, Gender::Male);
        assert_eq!(r.colonies, 25);
        assert_eq!(r.certificate_date, None);
        assert_eq!(r.birth_date, NaiveDate::from_ymd_opt(1970, 5, 1));
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let data = format!(
            "{HEADER}\
             a,Ana,Anić,Žensko,1980-01-01,,,10,14-01/23,1,2023,2023-04-01\n\
             b,Bo,Bo,Muško,01.01.1980,,,10,14-02/23,2,2023,\n\
             c,Ce,Ce,Muško,,,,many,14-03/23,3,2023,\n\
             d,De,De\n\
             e,Ee,Ee,Muško,,,,1,14-04/23,4,2023,\n"
        );
        let parsed = read_records(data.as_bytes());
        let ids: Vec<&str> = parsed.rows.iter().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        let lines: Vec<usize> = parsed.errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(parsed.errors[0].reason.contains("birthDate"));
        assert!(parsed.errors[1].reason.contains("colonies"));
    }

    #[test]
    fn encode_then_read_keeps_every_field() {
        let r = Registrant {
            id: "x-1".into(),
            first_name: "Dino, Jr.".into(),
            last_name: "\"Đapo\"".into(),
            gender: Gender::Other,
            birth_date: NaiveDate::from_ymd_opt(1990, 12, 31),
            birth_place: "Zenica".into(),
            residence_city: String::new(),
            colonies: 0,
            doc_number: "14-07/24".into(),
            seq_number: 7,
            year: 2024,
            certificate_date: NaiveDate::from_ymd_opt(2024, 3, 8),
        };
        let bytes = encode_records([&r]).expect("encode");
        let parsed = read_records(bytes.as_slice());
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows, vec![(2, r)]);
    }

    #[test]
    fn header_only_has_all_twelve_columns() {
        let bytes = header_only().expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text, HEADER);
    }
}
