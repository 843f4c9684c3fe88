//! SequenceAllocator: per-year registry of reserved sequence numbers.
//!
//! Правила:
//! - номер попадает в множество ровно один раз (allocation или import);
//! - удаление регистранта номер НЕ освобождает;
//! - освободить номера может только replace-import (replace_reservations).
//!
//! Atomicity of reserve_next comes from the caller: the Registry holds its
//! mutex across the scan and the insert.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::metrics::record_number_reserved;

/// year -> set of numbers ever handed out (or imported) for that year.
pub type Reservations = BTreeMap<i32, BTreeSet<u32>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceAllocator {
    reserved: Reservations,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reservations(reserved: Reservations) -> Self {
        let mut a = Self::default();
        a.replace_reservations(reserved);
        a
    }

    /// Smallest positive integer not yet reserved for `year`; reserved before returning.
    pub fn reserve_next(&mut self, year: i32) -> u32 {
        let set = self.reserved.entry(year).or_default();
        let mut next = 1u32;
        // BTreeSet iterates ascending: the first hole is the answer.
        for &n in set.iter() {
            if n > next {
                break;
            }
            if n == next {
                next += 1;
            }
        }
        set.insert(next);
        record_number_reserved();
        debug!("alloc: year={} reserved seq={}", year, next);
        next
    }

    /// Mark `seq` as reserved for `year`. Returns false if it already was.
    pub fn reserve(&mut self, year: i32, seq: u32) -> bool {
        if seq == 0 {
            return false;
        }
        self.reserved.entry(year).or_default().insert(seq)
    }

    pub fn is_reserved(&self, year: i32, seq: u32) -> bool {
        self.reserved
            .get(&year)
            .map(|s| s.contains(&seq))
            .unwrap_or(false)
    }

    /// Copy of the year's reservation set (empty if the year is unknown).
    pub fn reserved_set(&self, year: i32) -> BTreeSet<u32> {
        self.reserved.get(&year).cloned().unwrap_or_default()
    }

    /// Overwrite the whole registry. Numbers missing from `reserved` become free.
    pub fn replace_reservations(&mut self, reserved: Reservations) {
        self.reserved = reserved
            .into_iter()
            .map(|(y, set)| (y, set.into_iter().filter(|&n| n > 0).collect()))
            .filter(|(_, set): &(i32, BTreeSet<u32>)| !set.is_empty())
            .collect();
    }

    /// Add numbers without removing any.
    pub fn union_reservations(&mut self, reserved: &Reservations) {
        for (&year, set) in reserved {
            for &n in set {
                self.reserve(year, n);
            }
        }
    }

    /// Deep copy of the full registry.
    pub fn reservations(&self) -> Reservations {
        self.reserved.clone()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.reserved.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(v: &[u32]) -> BTreeSet<u32> {
        v.iter().copied().collect()
    }

    #[test]
    fn reserve_next_fills_gaps_from_one() {
        let mut a = SequenceAllocator::new();
        a.union_reservations(&Reservations::from([(2023, set(&[2, 3, 5]))]));
        assert_eq!(a.reserve_next(2023), 1);
        assert_eq!(a.reserve_next(2023), 4);
        assert_eq!(a.reserve_next(2023), 6);
        assert_eq!(a.reserve_next(2024), 1);
        assert_eq!(a.reserved_set(2023), set(&[1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn union_never_removes() {
        let mut a = SequenceAllocator::new();
        a.reserve_next(2023);
        a.reserve_next(2023);
        a.union_reservations(&Reservations::from([(2023, set(&[7]))]));
        assert_eq!(a.reserved_set(2023), set(&[1, 2, 7]));
    }

    #[test]
    fn replace_frees_missing_numbers() {
        let mut a = SequenceAllocator::new();
        for _ in 0..3 {
            a.reserve_next(2023);
        }
        a.replace_reservations(Reservations::from([(2023, set(&[2]))]));
        assert_eq!(a.reserve_next(2023), 1);
        assert_eq!(a.reserve_next(2023), 3);
    }

    #[test]
    fn zero_is_never_reserved() {
        let mut a = SequenceAllocator::new();
        assert!(!a.reserve(2023, 0));
        a.replace_reservations(Reservations::from([(2023, set(&[0]))]));
        assert!(a.reserved_set(2023).is_empty());
        assert_eq!(a.years().count(), 0);
    }

    #[test]
    fn randomized_reserve_sequence_is_gapless() {
        let mut rng = oorandom::Rand32::new(7);
        let mut a = SequenceAllocator::new();
        let mut expected: BTreeMap<i32, u32> = BTreeMap::new();
        for _ in 0..500 {
            let year = 2020 + rng.rand_range(0..4) as i32;
            let got = a.reserve_next(year);
            let want = expected.entry(year).or_insert(0);
            *want += 1;
            assert_eq!(got, *want);
        }
    }
}
