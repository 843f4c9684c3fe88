//! Read-only queries. Everything returned is a copy, never the live partition.

use chrono::{Datelike, Local};
use std::collections::BTreeSet;

use super::core::RecordStore;
use crate::model::Registrant;
use crate::util::fold_for_search;

impl RecordStore {
    /// Copy of the year's registrants in insertion order.
    pub fn registrants_for_year(&self, year: i32) -> Vec<Registrant> {
        self.partitions.get(&year).cloned().unwrap_or_default()
    }

    /// Every registrant across all years.
    pub fn all_registrants(&self) -> Vec<Registrant> {
        self.partitions.values().flatten().cloned().collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Registrant> {
        self.partitions.values().flatten().find(|r| r.id == id)
    }

    pub fn get(&self, year: i32, id: &str) -> Option<&Registrant> {
        let idx = self.position(year, id)?;
        self.partitions.get(&year).and_then(|list| list.get(idx))
    }

    pub fn exists_same_name(&self, year: i32, first_name: &str, last_name: &str) -> bool {
        self.partitions
            .get(&year)
            .map(|list| list.iter().any(|r| r.has_name(first_name, last_name)))
            .unwrap_or(false)
    }

    /// Highest-year registrant strictly before `year` with the same name.
    pub fn latest_registrant_before(
        &self,
        first_name: &str,
        last_name: &str,
        year: i32,
    ) -> Option<Registrant> {
        self.partitions
            .range(..year)
            .rev()
            .find_map(|(_, list)| list.iter().find(|r| r.has_name(first_name, last_name)))
            .cloned()
    }

    /// Years with at least one registrant plus the current calendar year, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        let mut years: BTreeSet<i32> = self
            .partitions
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&y, _)| y)
            .collect();
        years.insert(Local::now().year());
        years
    }

    /// Case- and diacritic-insensitive substring search over the visible fields.
    /// An empty query returns the whole year.
    pub fn search(&self, year: i32, query: &str) -> Vec<Registrant> {
        search_in(&self.registrants_for_year(year), query)
    }
}

/// Shared by the live store and the backup view.
pub fn search_in(registrants: &[Registrant], query: &str) -> Vec<Registrant> {
    let q = fold_for_search(query.trim());
    if q.is_empty() {
        return registrants.to_vec();
    }
    registrants
        .iter()
        .filter(|r| {
            r.visible_fields()
                .iter()
                .any(|f| fold_for_search(f).contains(&q))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;

    fn reg(id: &str, first: &str, last: &str, year: i32, seq: u32) -> Registrant {
        Registrant {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            gender: Gender::Male,
            birth_date: None,
            birth_place: "Tuzla".to_string(),
            residence_city: "Živinice".to_string(),
            colonies: 12,
            doc_number: format!("14-{:02}/{:02}", seq, year % 100),
            seq_number: seq,
            year,
            certificate_date: None,
        }
    }

    #[test]
    fn latest_before_picks_highest_earlier_year() {
        let store = RecordStore::from_registrants(vec![
            reg("a", "Mujo", "Mujić", 2019, 1),
            reg("b", "mujo", "MUJIĆ", 2021, 4),
            reg("c", "Mujo", "Mujić", 2023, 2),
        ]);
        let got = store
            .latest_registrant_before("Mujo", "Mujić", 2023)
            .expect("2021 record must be found");
        assert_eq!(got.id, "b");
        assert!(store.latest_registrant_before("Mujo", "Mujić", 2019).is_none());
    }

    #[test]
    fn years_include_current_calendar_year() {
        let store = RecordStore::from_registrants(vec![reg("a", "A", "A", 1999, 1)]);
        let years = store.years();
        assert!(years.contains(&1999));
        assert!(years.contains(&Local::now().year()));
    }

    #[test]
    fn registrants_for_year_is_a_copy_in_insertion_order() {
        let mut store = RecordStore::from_registrants(vec![
            reg("b", "B", "B", 2023, 2),
            reg("a", "A", "A", 2023, 1),
        ]);
        let mut copy = store.registrants_for_year(2023);
        copy.clear();
        store.insert(reg("c", "C", "C", 2023, 3));
        let ids: Vec<String> = store
            .registrants_for_year(2023)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn search_folds_diacritics() {
        let store = RecordStore::from_registrants(vec![
            reg("a", "Ćamil", "Šehić", 2023, 1),
            reg("b", "Ana", "Anić", 2023, 2),
        ]);
        let hits = store.search(2023, "sehic");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert_eq!(store.search(2023, "zivinice").len(), 2);
        assert_eq!(store.search(2023, "14-02").len(), 1);
        assert_eq!(store.search(2023, "  ").len(), 2);
    }
}
