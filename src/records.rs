use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::sanitize::sanitize_text;

/// Card summary, the only mandatory source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CardRecord {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub metadata: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub types: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub sources: Vec<String>,
}

/// Treats an explicit JSON `null` like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Demographic record as published in `table1_detail_data.json`. Most fields
/// are loosely typed in the source and stay as raw JSON until the builder
/// sanitises them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Table1Record {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "year release", default)]
    pub year_release: Value,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub male: Value,
    #[serde(default)]
    pub female: Value,
    #[serde(rename = "age range", default)]
    pub age_range: Value,
    #[serde(rename = "Ethinicities", alias = "Ethnicities", default)]
    pub ethnicities: Value,
    #[serde(rename = "CGM Device", default)]
    pub cgm_device: Value,
    #[serde(rename = "Total days of glucose", default)]
    pub total_days: Value,
    #[serde(rename = "Glucose samples", default)]
    pub glucose_samples: Value,
    #[serde(rename = "average days per participant", default)]
    pub avg_days_per_participant: Value,
    #[serde(default)]
    pub data_source: Option<BTreeMap<String, Value>>,
    #[serde(rename = "populationGroups", default)]
    pub population_groups: Option<Vec<PopulationCount>>,
    #[serde(rename = "Link to dataset", default)]
    pub link: Value,
}

impl Table1Record {
    pub fn has_data_source(&self) -> bool {
        self.data_source
            .as_ref()
            .is_some_and(|sources| !sources.is_empty())
    }

    pub fn population_groups(&self) -> &[PopulationCount] {
        self.population_groups.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PopulationCount {
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    pub kind: String,
    #[serde(default)]
    pub count: Value,
}

/// Letter code to source name, e.g. `G` to "Continuous Glucose Monitoring".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DataSourceGlossary(pub BTreeMap<String, Value>);

impl DataSourceGlossary {
    pub fn name_for(&self, letter: &str) -> Option<String> {
        let name = sanitize_text(self.0.get(letter));
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistogramSeries {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub data: Vec<HistogramSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistogramSample {
    #[serde(default)]
    pub bin_start: Value,
    #[serde(default)]
    pub bin_end: Value,
    #[serde(default)]
    pub x: Value,
    #[serde(default)]
    pub y: Value,
    #[serde(default)]
    pub label: Value,
}

/// Time-in-range values for one dataset, one entry per population group in
/// source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeInRangeTable {
    pub groups: Vec<TimeInRangeGroup>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeInRangeGroup {
    pub label: String,
    pub values: Map<String, Value>,
}

impl TimeInRangeTable {
    /// Reads `{ "<group>": { "target": 40, ... }, ... }`. Groups whose value is
    /// not an object are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let groups = object
            .iter()
            .filter_map(|(label, values)| {
                values.as_object().map(|values| TimeInRangeGroup {
                    label: label.clone(),
                    values: values.clone(),
                })
            })
            .collect();
        Some(Self { groups })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeInRangeEntry {
    pub dataset: String,
    pub table: TimeInRangeTable,
}

/// Splits `time_in_ranges_by_type.json` into per-dataset entries, keeping
/// document order.
pub fn time_in_range_entries(document: &Value) -> Option<Vec<TimeInRangeEntry>> {
    let object = document.as_object()?;
    let entries = object
        .iter()
        .filter_map(|(dataset, table)| {
            TimeInRangeTable::from_json(table).map(|table| TimeInRangeEntry {
                dataset: dataset.clone(),
                table,
            })
        })
        .collect();
    Some(entries)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn table1_reads_display_field_names() {
        let record: Table1Record = serde_json::from_value(json!({
            "name": "CGMacros",
            "year release": "2024",
            "total": 45,
            "Ethinicities": "NR",
            "CGM Device": "Libre Pro",
            "Total days of glucose": "10–30",
            "populationGroups": [{"type": "Type 2 diabetes", "count": 14}],
            "Link to dataset": "https://example.org"
        }))
        .unwrap();
        assert_eq!(record.cgm_device, json!("Libre Pro"));
        assert_eq!(record.population_groups().len(), 1);
        assert!(!record.has_data_source());
    }

    #[test]
    fn null_card_fields_become_defaults() {
        let card: CardRecord = serde_json::from_value(json!({
            "title": "A",
            "metadata": null,
            "description": null,
            "types": null,
            "sources": null
        }))
        .unwrap();
        assert_eq!(card.metadata, "");
        assert!(card.types.is_empty());
        assert!(card.sources.is_empty());
    }

    #[test]
    fn null_population_type_keeps_the_record() {
        let record: Table1Record = serde_json::from_value(json!({
            "name": null,
            "populationGroups": [{"type": null, "count": 3}]
        }))
        .unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.population_groups()[0].kind, "");
    }

    #[test]
    fn empty_data_source_map_is_not_populated() {
        let record: Table1Record =
            serde_json::from_value(json!({"name": "x", "data_source": {}})).unwrap();
        assert!(!record.has_data_source());
    }

    #[test]
    fn time_in_range_keeps_document_order() {
        let entries = time_in_range_entries(&json!({
            "Zeta": {"T1D": {"target": 1}},
            "Alpha": {"ND": {"target": 2}, "broken": 4}
        }))
        .unwrap();
        assert_eq!(entries[0].dataset, "Zeta");
        assert_eq!(entries[1].table.groups.len(), 1);
    }
}
