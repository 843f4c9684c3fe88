use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::util::{fold_for_search, same_name};

/// Gender labels as they appear in the record file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Muško",
            Gender::Female => "Žensko",
            Gender::Other => "Drugo",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = String;

    /// Accepts the stored labels (diacritics optional) and short forms.
    /// An empty cell maps to `Other`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_for_search(s.trim()).as_str() {
            "musko" | "m" | "male" => Ok(Gender::Male),
            "zensko" | "z" | "f" | "female" => Ok(Gender::Female),
            "drugo" | "other" | "" => Ok(Gender::Other),
            _ => Err(format!("unknown gender label '{}'", s.trim())),
        }
    }
}

/// A beekeeper registered for one year.
///
/// `id`, `seq_number`, `doc_number` and `year` are fixed at creation;
/// an edit replaces everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: String,
    pub residence_city: String,
    pub colonies: u32,
    pub doc_number: String,
    pub seq_number: u32,
    pub year: i32,
    pub certificate_date: Option<NaiveDate>,
}

impl Registrant {
    /// Case-insensitive (first, last) match, surrounding whitespace ignored.
    pub fn has_name(&self, first_name: &str, last_name: &str) -> bool {
        same_name(&self.first_name, first_name) && same_name(&self.last_name, last_name)
    }

    /// Editable part of the record (used for prefill and edits).
    pub fn to_draft(&self) -> RegistrantDraft {
        RegistrantDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender,
            birth_date: self.birth_date,
            birth_place: self.birth_place.clone(),
            residence_city: self.residence_city.clone(),
            colonies: self.colonies,
            certificate_date: self.certificate_date,
        }
    }

    /// Replace the editable fields, keeping identity, numbering and year.
    pub fn apply_draft(&mut self, draft: RegistrantDraft) {
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.gender = draft.gender;
        self.birth_date = draft.birth_date;
        self.birth_place = draft.birth_place;
        self.residence_city = draft.residence_city;
        self.colonies = draft.colonies;
        self.certificate_date = draft.certificate_date;
    }

    /// Fields shown to a user, in display order (id excluded).
    pub fn visible_fields(&self) -> Vec<String> {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.gender.label().to_string(),
            date(self.birth_date),
            self.birth_place.clone(),
            self.residence_city.clone(),
            self.colonies.to_string(),
            self.doc_number.clone(),
            date(self.certificate_date),
        ]
    }
}

/// User-editable fields of a registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantDraft {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub birth_place: String,
    #[serde(default)]
    pub residence_city: String,
    #[serde(default)]
    pub colonies: u32,
    #[serde(default)]
    pub certificate_date: Option<NaiveDate>,
}

impl RegistrantDraft {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender: Gender::Other,
            birth_date: None,
            birth_place: String::new(),
            residence_city: String::new(),
            colonies: 0,
            certificate_date: None,
        }
    }
}
