use tracing::{debug, warn};

use crate::names::{alias_for, normalize_key};
use crate::records::{CardRecord, HistogramSeries, Table1Record, TimeInRangeEntry};

/// A record that can be looked up by a free-text dataset name.
pub trait Keyed {
    fn key(&self) -> &str;

    /// Tie-break among records sharing a resolved key.
    fn is_preferred(&self) -> bool {
        false
    }
}

impl Keyed for CardRecord {
    fn key(&self) -> &str {
        &self.title
    }
}

impl Keyed for Table1Record {
    fn key(&self) -> &str {
        &self.name
    }

    fn is_preferred(&self) -> bool {
        self.has_data_source()
    }
}

impl Keyed for HistogramSeries {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for TimeInRangeEntry {
    fn key(&self) -> &str {
        &self.dataset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPass {
    Exact,
    Normalized,
    CaseInsensitive,
}

impl MatchPass {
    pub const ALL: [MatchPass; 3] = [
        MatchPass::Exact,
        MatchPass::Normalized,
        MatchPass::CaseInsensitive,
    ];

    fn matches(self, candidate: &str, key: &str) -> bool {
        match self {
            MatchPass::Exact => candidate == key,
            MatchPass::Normalized => normalize_key(candidate) == normalize_key(key),
            MatchPass::CaseInsensitive => candidate.to_lowercase() == key.to_lowercase(),
        }
    }
}

/// Ordered names to try for one dataset: the card title, its alias, the
/// matched table1 name, the raw id and the id's alias. Blanks and repeats are
/// dropped.
pub fn candidate_names(
    title: &str,
    table1_name: Option<&str>,
    dataset_id: &str,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let ordered = [
        Some(title),
        alias_for(title),
        table1_name,
        Some(dataset_id),
        alias_for(dataset_id),
    ];
    for name in ordered.into_iter().flatten() {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Finds at most one record for `dataset_id`. Each pass runs over the whole
/// candidate list before the next, looser pass is tried.
pub fn match_record<'a, T: Keyed>(
    dataset_id: &str,
    candidates: &[String],
    records: &'a [T],
) -> Option<&'a T> {
    for pass in MatchPass::ALL {
        for candidate in candidates {
            let hits = records
                .iter()
                .filter(|record| pass.matches(candidate, record.key()))
                .collect::<Vec<_>>();
            let Some(first) = hits.first() else {
                continue;
            };
            if hits.len() > 1 {
                let distinct = hits.iter().any(|record| record.key() != first.key());
                if distinct {
                    warn!(
                        dataset = dataset_id,
                        candidate = candidate.as_str(),
                        ?pass,
                        count = hits.len(),
                        "ambiguous match across distinct keys, taking first"
                    );
                }
            }
            let chosen = hits
                .iter()
                .find(|record| record.is_preferred())
                .unwrap_or(first);
            debug!(
                dataset = dataset_id,
                candidate = candidate.as_str(),
                key = chosen.key(),
                ?pass,
                "matched"
            );
            return Some(*chosen);
        }
    }
    debug!(dataset = dataset_id, "no match");
    None
}
