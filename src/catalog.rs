use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CatalogError;
use crate::names::{normalize_diabetes_label, slug};
use crate::records::CardRecord;
use crate::sanitize::sanitize_str;

static PARTICIPANTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s+participants").expect("participants pattern")
});
static STUDY_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s+days?\b").expect("days pattern"));

/// Participant count from card metadata such as "48 participants • 22 days".
pub fn parse_participants(metadata: &str) -> Option<f64> {
    parse_count(&PARTICIPANTS, metadata)
}

pub fn parse_study_days(metadata: &str) -> Option<f64> {
    parse_count(&STUDY_DAYS, metadata)
}

fn parse_count(pattern: &Regex, text: &str) -> Option<f64> {
    let caps = pattern.captures(text)?;
    caps[1].replace(',', "").parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Access {
    Public,
    Controlled,
}

impl Access {
    pub fn from_metadata(metadata: &str) -> Option<Self> {
        let lowered = metadata.to_lowercase();
        if lowered.contains("public access") {
            Some(Access::Public)
        } else if lowered.contains("controlled") {
            Some(Access::Controlled)
        } else {
            None
        }
    }
}

impl FromStr for Access {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "public access" | "public" => Ok(Access::Public),
            "controlled" | "controlled access" => Ok(Access::Controlled),
            _ => Err(CatalogError::InvalidFilter(value.to_string())),
        }
    }
}

/// One card in the list view with the facets the filter bar works on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub metadata: String,
    pub description: String,
    pub participants: Option<f64>,
    pub study_days: Option<f64>,
    pub access: Option<Access>,
    pub populations: Vec<String>,
    pub sources: Vec<String>,
}

impl From<&CardRecord> for CatalogEntry {
    fn from(card: &CardRecord) -> Self {
        let title = sanitize_str(&card.title);
        Self {
            id: slug(&title),
            metadata: sanitize_str(&card.metadata),
            description: sanitize_str(&card.description),
            participants: parse_participants(&card.metadata),
            study_days: parse_study_days(&card.metadata),
            access: Access::from_metadata(&card.metadata),
            populations: card
                .types
                .iter()
                .map(|kind| normalize_diabetes_label(kind.trim()))
                .collect(),
            sources: card
                .sources
                .iter()
                .map(|letter| letter.trim().to_uppercase())
                .collect(),
            title,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub data_types: Vec<String>,
    pub populations: Vec<String>,
    pub min_days: Option<f64>,
    pub min_participants: Option<f64>,
    pub access: Option<Access>,
}

impl CatalogFilter {
    /// Builds a filter from the option labels shown in the filter bar.
    pub fn from_labels(
        data_types: &[String],
        populations: &[String],
        duration: Option<&str>,
        sample_size: Option<&str>,
        access: Option<&str>,
    ) -> Result<Self, CatalogError> {
        let data_types = data_types
            .iter()
            .map(|label| data_type_letter(label).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        let populations = populations
            .iter()
            .map(|label| population_code(label))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            data_types,
            populations,
            min_days: duration.map(duration_days).transpose()?,
            min_participants: sample_size.map(sample_size_min).transpose()?,
            access: access.map(str::parse::<Access>).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.data_types.is_empty()
            && self.populations.is_empty()
            && self.min_days.is_none()
            && self.min_participants.is_none()
            && self.access.is_none()
    }

    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        any_of(&self.data_types, &entry.sources)
            && any_of(&self.populations, &entry.populations)
            && at_least(self.min_days, entry.study_days)
            && at_least(self.min_participants, entry.participants)
            && self.access.is_none_or(|access| entry.access == Some(access))
    }
}

fn any_of(wanted: &[String], present: &[String]) -> bool {
    wanted.is_empty() || wanted.iter().any(|value| present.contains(value))
}

fn at_least(minimum: Option<f64>, value: Option<f64>) -> bool {
    match minimum {
        Some(minimum) => value.is_some_and(|value| value >= minimum),
        None => true,
    }
}

pub fn data_type_letter(label: &str) -> Result<&'static str, CatalogError> {
    match label.trim().to_lowercase().as_str() {
        "cgm" | "glucose" | "g" => Ok("G"),
        "insulin delivery" | "insulin" | "i" => Ok("I"),
        "activity tracker" | "activity" | "a" => Ok("A"),
        "self report" | "s" => Ok("S"),
        "questionnaire" | "q" => Ok("Q"),
        "lab measurements" | "characteristics" | "c" => Ok("C"),
        "meals" | "m" => Ok("M"),
        "wearables" | "w" => Ok("W"),
        _ => Err(CatalogError::InvalidFilter(label.to_string())),
    }
}

pub fn population_code(label: &str) -> Result<String, CatalogError> {
    let code = normalize_diabetes_label(label.trim());
    if crate::names::POPULATION_ORDER.contains(&code.as_str()) {
        Ok(code)
    } else {
        Err(CatalogError::InvalidFilter(label.to_string()))
    }
}

/// "7+ days", "14+ days", "1 month", "2+ months".
pub fn duration_days(label: &str) -> Result<f64, CatalogError> {
    let lowered = label.trim().to_lowercase();
    let (number, unit) = lowered
        .split_once(|ch: char| !ch.is_ascii_digit())
        .map(|(number, rest)| (number, rest.trim_start_matches('+').trim()))
        .ok_or_else(|| CatalogError::InvalidFilter(label.to_string()))?;
    let count = number
        .parse::<f64>()
        .map_err(|_| CatalogError::InvalidFilter(label.to_string()))?;
    match unit {
        "day" | "days" => Ok(count),
        "month" | "months" => Ok(count * 30.0),
        _ => Err(CatalogError::InvalidFilter(label.to_string())),
    }
}

/// "20+", "1000+".
pub fn sample_size_min(label: &str) -> Result<f64, CatalogError> {
    label
        .trim()
        .trim_end_matches('+')
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| CatalogError::InvalidFilter(label.to_string()))
}
