//! Reservation registry file.
//!
//! Формат: <data_dir>/reserved_numbers.json
//! {"2023":[1,2,3],"2024":[1]}
//!
//! Keys are years as strings, values sorted arrays. A file that does not parse
//! is treated as absent (the registry then comes from the record file alone).

use anyhow::{anyhow, Context, Result};
use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::alloc::Reservations;

pub fn encode_reservations(reserved: &Reservations) -> Result<Vec<u8>> {
    let out: BTreeMap<String, Vec<u32>> = reserved
        .iter()
        .filter(|(_, set)| !set.is_empty())
        .map(|(y, set)| (y.to_string(), set.iter().copied().collect()))
        .collect();
    serde_json::to_vec(&out).context("serialize reserved numbers")
}

/// Strict decode; any structural problem is an error.
pub fn decode_reservations(bytes: &[u8]) -> Result<Reservations> {
    let raw: Option<BTreeMap<String, Vec<u32>>> =
        serde_json::from_slice(bytes).context("parse reserved numbers")?;
    let mut out = Reservations::new();
    for (key, nums) in raw.unwrap_or_default() {
        let year: i32 = key
            .trim()
            .parse()
            .map_err(|_| anyhow!("year key '{}' is not a number", key))?;
        let set: BTreeSet<u32> = nums.into_iter().filter(|&n| n > 0).collect();
        out.entry(year).or_default().extend(set);
    }
    Ok(out)
}

/// Load the registry file. Missing, unreadable or malformed -> None (logged).
pub fn read_reservations_from_path(path: &Path) -> Option<Reservations> {
    if !path.exists() {
        return None;
    }
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!("reserved: cannot read {}: {}", path.display(), e);
            return None;
        }
    };
    match decode_reservations(&bytes) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!("reserved: ignoring malformed {}: {:#}", path.display(), e);
            None
        }
    }
}
