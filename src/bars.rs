use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::names::{compare_population, normalize_diabetes_label};
use crate::records::{Table1Record, TimeInRangeTable};
use crate::sanitize::{sanitize_number, sanitize_positive};

/// Bar height used when a group has no participant count.
pub const PERCENT_TOTAL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GlucoseRange {
    VeryLow,
    Low,
    Target,
    High,
    VeryHigh,
}

impl GlucoseRange {
    pub const ORDER: [GlucoseRange; 5] = [
        GlucoseRange::VeryLow,
        GlucoseRange::Low,
        GlucoseRange::Target,
        GlucoseRange::High,
        GlucoseRange::VeryHigh,
    ];

    /// Key used by `time_in_ranges_by_type.json`.
    pub fn source_key(self) -> &'static str {
        match self {
            GlucoseRange::VeryLow => "very_low",
            GlucoseRange::Low => "low",
            GlucoseRange::Target => "target",
            GlucoseRange::High => "high",
            GlucoseRange::VeryHigh => "very_high",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GlucoseRange::VeryLow => "Very low glucose",
            GlucoseRange::Low => "Low glucose",
            GlucoseRange::Target => "Target glucose",
            GlucoseRange::High => "High glucose",
            GlucoseRange::VeryHigh => "Very high glucose",
        }
    }

    pub fn band(self) -> &'static str {
        match self {
            GlucoseRange::VeryLow => "<54mg/dL",
            GlucoseRange::Low => "54-69mg/dL",
            GlucoseRange::Target => "70-180mg/dL",
            GlucoseRange::High => "181-250mg/dL",
            GlucoseRange::VeryHigh => ">250mg/dL",
        }
    }

    /// Classifies a histogram label such as "Target glucose (70-180)".
    /// The "very" variants are checked first since their titles contain the
    /// shorter ones.
    pub fn from_label(label: &str) -> Option<Self> {
        let lowered = label.to_lowercase();
        [
            GlucoseRange::VeryLow,
            GlucoseRange::VeryHigh,
            GlucoseRange::Low,
            GlucoseRange::Target,
            GlucoseRange::High,
        ]
        .into_iter()
        .find(|range| lowered.contains(&range.title().to_lowercase()))
    }
}

impl fmt::Display for GlucoseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub key: GlucoseRange,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBarGroup {
    pub group: String,
    pub total: f64,
    pub segments: Vec<Segment>,
}

impl StackedBarGroup {
    /// Placeholder bar for a population with no time-in-range data.
    pub fn empty(group: &str) -> Self {
        Self {
            group: group.to_string(),
            total: PERCENT_TOTAL,
            segments: GlucoseRange::ORDER
                .into_iter()
                .map(|key| Segment { key, value: 0.0 })
                .collect(),
        }
    }

    pub fn segment_sum(&self) -> f64 {
        self.segments.iter().map(|segment| segment.value).sum()
    }

    pub fn value(&self, key: GlucoseRange) -> f64 {
        self.segments
            .iter()
            .find(|segment| segment.key == key)
            .map(|segment| segment.value)
            .unwrap_or(0.0)
    }
}

/// Positive participant counts per population code, taken from table1's
/// population groups.
pub fn totals_from_table1(record: &Table1Record) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for group in record.population_groups() {
        let count = sanitize_number(Some(&group.count));
        if count > 0.0 {
            totals.insert(normalize_diabetes_label(&group.kind), count);
        }
    }
    totals
}

/// Turns a raw time-in-range table into bar-chart groups ordered
/// `ND, PreD, T2D, T1D`, then alphabetically. Groups summing to zero are kept.
pub fn to_stacked_bars(
    table: &TimeInRangeTable,
    totals: Option<&BTreeMap<String, f64>>,
) -> Vec<StackedBarGroup> {
    let mut bars = table
        .groups
        .iter()
        .map(|raw| {
            let group = normalize_diabetes_label(&raw.label);
            let segments = GlucoseRange::ORDER
                .into_iter()
                .map(|key| Segment {
                    key,
                    value: sanitize_positive(raw.values.get(key.source_key())),
                })
                .collect();
            let total = totals
                .and_then(|totals| totals.get(&group))
                .copied()
                .filter(|count| count.is_finite() && *count > 0.0)
                .unwrap_or(PERCENT_TOTAL);
            StackedBarGroup {
                group,
                total,
                segments,
            }
        })
        .collect::<Vec<_>>();

    bars.sort_by(|a, b| compare_population(&a.group, &b.group));
    bars
}
