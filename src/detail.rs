use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::bars::StackedBarGroup;
use crate::catalog::parse_participants;
use crate::histogram::{HistogramBin, histogram_bins};
use crate::names::{normalize_diabetes_label, slug};
use crate::records::{CardRecord, DataSourceGlossary, HistogramSeries, Table1Record};
use crate::sanitize::{
    format_count, sanitize_number, sanitize_positive, sanitize_str, sanitize_text,
};

static DAY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[–—-]\s*(\d+(?:\.\d+)?)").expect("day range pattern")
});
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)").expect("leading number pattern")
});

const DEFAULT_SOURCE_NAMES: &[(&str, &str)] = &[
    ("G", "Glucose"),
    ("I", "Insulin"),
    ("A", "Activity"),
    ("S", "Self report"),
    ("Q", "Questionnaire"),
    ("M", "Meals"),
    ("W", "Wearables"),
    ("C", "Characteristics"),
];
const UNKNOWN_SOURCE_NAME: &str = "Source";
const ALL_GROUP: &str = "All";
const PLACEHOLDER_DESCRIPTION: &str = "Description TBD";
const DOWNLOAD_LABEL: &str = "Download dataset";
const PAPER_LABEL: &str = "Link to dataset source";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetDetail {
    pub id: String,
    pub title: String,
    pub metadata: String,
    pub duration: String,
    pub date_range: String,
    pub full_description: String,
    pub actions: DetailActions,
    pub dataset_link: String,
    pub participants_total: f64,
    pub population_groups: Vec<PopulationGroup>,
    pub demographics: Demographics,
    pub data_sources: Vec<DataSourceEntry>,
    pub cgm_summary: CgmSummary,
    pub time_in_ranges: Vec<StackedBarGroup>,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailActions {
    pub download_label: String,
    pub paper_label: String,
}

impl Default for DetailActions {
    fn default() -> Self {
        Self {
            download_label: DOWNLOAD_LABEL.to_string(),
            paper_label: PAPER_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationGroup {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub count: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub gender: String,
    pub ethnicities: String,
    pub age_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceEntry {
    pub icon: String,
    pub name: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CgmSummary {
    pub device: String,
    pub total_days: f64,
    pub total_days_range: String,
    pub glucose_samples: f64,
    pub avg_days_per_participant: f64,
}

/// First present value in priority order.
pub fn first_defined<T>(candidates: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// Builds the detail view model. Pure: every optional source may be absent and
/// every output field falls back to a concrete default.
pub fn build(
    card: &CardRecord,
    table1: Option<&Table1Record>,
    glossary: Option<&DataSourceGlossary>,
    histogram: Option<&HistogramSeries>,
    time_in_ranges: Option<Vec<StackedBarGroup>>,
) -> DatasetDetail {
    let title = sanitize_str(&card.title);
    let card_groups = card_population_codes(card);

    let participants_total = first_defined([
        table1
            .map(|record| sanitize_number(Some(&record.total)))
            .filter(|total| *total > 0.0),
        parse_participants(&card.metadata),
    ])
    .unwrap_or(0.0);

    let cgm_device = table1
        .map(|record| sanitize_text(Some(&record.cgm_device)))
        .unwrap_or_default();
    let total_days_text = table1
        .map(|record| sanitize_text(Some(&record.total_days)))
        .unwrap_or_default();
    let total_days = parse_total_days(&total_days_text);
    let total_days_range = if !total_days_text.is_empty() {
        total_days_text.clone()
    } else if total_days > 0.0 {
        format_count(total_days)
    } else {
        String::new()
    };

    let year_release = table1
        .map(|record| sanitize_text(Some(&record.year_release)))
        .unwrap_or_default();
    let duration = if year_release.is_empty() {
        String::new()
    } else {
        format!("Year released: {year_release}")
    };

    let full_description = match sanitize_str(&card.description) {
        description if description == PLACEHOLDER_DESCRIPTION => String::new(),
        description => description,
    };

    let time_in_ranges = time_in_ranges
        .filter(|bars| !bars.is_empty())
        .unwrap_or_else(|| {
            card_groups
                .iter()
                .map(|group| StackedBarGroup::empty(group))
                .collect()
        });

    DatasetDetail {
        id: slug(&title),
        metadata: sanitize_str(&card.metadata),
        duration,
        date_range: String::new(),
        full_description,
        actions: DetailActions::default(),
        dataset_link: table1
            .map(|record| sanitize_text(Some(&record.link)))
            .unwrap_or_default(),
        participants_total,
        population_groups: population_groups(table1, &card_groups),
        demographics: demographics(table1),
        data_sources: data_sources(card, table1, glossary, &cgm_device),
        cgm_summary: CgmSummary {
            device: cgm_device,
            total_days,
            total_days_range,
            glucose_samples: table1
                .map(|record| sanitize_number(Some(&record.glucose_samples)))
                .unwrap_or_default(),
            avg_days_per_participant: table1
                .map(|record| sanitize_number(Some(&record.avg_days_per_participant)))
                .unwrap_or_default(),
        },
        time_in_ranges,
        histogram: histogram.map(histogram_bins).unwrap_or_default(),
        title,
    }
}

/// Card type codes, or a single `All` group when the card lists none.
fn card_population_codes(card: &CardRecord) -> Vec<String> {
    let codes = card
        .types
        .iter()
        .map(|kind| sanitize_str(kind))
        .filter(|kind| !kind.is_empty())
        .map(|kind| normalize_diabetes_label(&kind))
        .collect::<Vec<_>>();
    if codes.is_empty() {
        vec![ALL_GROUP.to_string()]
    } else {
        codes
    }
}

fn population_groups(
    table1: Option<&Table1Record>,
    card_groups: &[String],
) -> Vec<PopulationGroup> {
    let explicit = table1
        .map(|record| record.population_groups())
        .unwrap_or_default();
    if !explicit.is_empty() {
        return explicit
            .iter()
            .map(|group| {
                let label = sanitize_str(&group.kind);
                PopulationGroup {
                    kind: normalize_diabetes_label(&label),
                    label,
                    count: sanitize_positive(Some(&group.count)),
                }
            })
            .collect();
    }
    card_groups
        .iter()
        .map(|code| PopulationGroup {
            kind: code.clone(),
            label: code.clone(),
            count: 0.0,
        })
        .collect()
}

fn demographics(table1: Option<&Table1Record>) -> Demographics {
    let Some(record) = table1 else {
        return Demographics::default();
    };
    Demographics {
        gender: gender_text(
            sanitize_positive(Some(&record.female)),
            sanitize_positive(Some(&record.male)),
        ),
        ethnicities: sanitize_text(Some(&record.ethnicities)),
        age_range: sanitize_text(Some(&record.age_range)),
    }
}

fn gender_text(female: f64, male: f64) -> String {
    let mut parts = Vec::new();
    if female > 0.0 {
        parts.push(format!("{} female", format_count(female.round())));
    }
    if male > 0.0 {
        parts.push(format!("{} male", format_count(male.round())));
    }
    parts.join(", ")
}

fn data_sources(
    card: &CardRecord,
    table1: Option<&Table1Record>,
    glossary: Option<&DataSourceGlossary>,
    cgm_device: &str,
) -> Vec<DataSourceEntry> {
    if let Some(details) = table1
        .and_then(|record| record.data_source.as_ref())
        .filter(|details| !details.is_empty())
    {
        let mut entries = details
            .iter()
            .map(|(letter, detail)| source_entry(letter, glossary, sanitize_text(Some(detail))))
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.icon.cmp(&b.icon));
        return entries;
    }

    card.sources
        .iter()
        .map(|letter| {
            let detail = if letter.trim().eq_ignore_ascii_case("G") {
                cgm_device.to_string()
            } else {
                String::new()
            };
            source_entry(letter, glossary, detail)
        })
        .collect()
}

fn source_entry(
    letter: &str,
    glossary: Option<&DataSourceGlossary>,
    detail: String,
) -> DataSourceEntry {
    let icon = letter.trim().to_uppercase();
    let name = first_defined([
        glossary.and_then(|glossary| glossary.name_for(&icon)),
        default_source_name(&icon).map(str::to_string),
    ])
    .unwrap_or_else(|| UNKNOWN_SOURCE_NAME.to_string());
    DataSourceEntry { icon, name, detail }
}

pub fn default_source_name(letter: &str) -> Option<&'static str> {
    DEFAULT_SOURCE_NAMES
        .iter()
        .find(|(code, _)| *code == letter)
        .map(|(_, name)| *name)
}

/// Numeric value of a total-days cell: the upper bound of an `N–M` range, a
/// leading bare number, or `0.0`.
pub fn parse_total_days(text: &str) -> f64 {
    if let Some(caps) = DAY_RANGE.captures(text) {
        let low = caps[1].parse::<f64>().unwrap_or(0.0);
        let high = caps[2].parse::<f64>().unwrap_or(0.0);
        return low.max(high);
    }
    LEADING_NUMBER
        .find(text.trim())
        .and_then(|found| found.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_days_range_takes_upper_bound() {
        assert_eq!(parse_total_days("10–30"), 30.0);
        assert_eq!(parse_total_days("14 - 7"), 14.0);
        assert_eq!(parse_total_days("22 days"), 22.0);
        assert_eq!(parse_total_days("about a month"), 0.0);
    }

    #[test]
    fn gender_omits_zero_side() {
        assert_eq!(gender_text(12.0, 0.0), "12 female");
        assert_eq!(gender_text(0.0, 7.4), "7 male");
        assert_eq!(gender_text(3.0, 4.0), "3 female, 4 male");
        assert_eq!(gender_text(0.0, 0.0), "");
    }

    #[test]
    fn first_defined_skips_missing() {
        assert_eq!(first_defined([None, Some(2), Some(3)]), Some(2));
        assert_eq!(first_defined::<u8>([None, None]), None);
    }
}
