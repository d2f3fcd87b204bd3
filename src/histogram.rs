use std::collections::BTreeMap;

use serde::Serialize;

use crate::bars::GlucoseRange;
use crate::records::HistogramSeries;
use crate::sanitize::{sanitize_number, sanitize_positive, sanitize_text};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub range: Option<GlucoseRange>,
}

pub fn histogram_bins(series: &HistogramSeries) -> Vec<HistogramBin> {
    series
        .data
        .iter()
        .map(|sample| {
            let label = sanitize_text(Some(&sample.label));
            HistogramBin {
                bin_start: sanitize_number(Some(&sample.bin_start)),
                bin_end: sanitize_number(Some(&sample.bin_end)),
                x: sanitize_number(Some(&sample.x)),
                y: sanitize_positive(Some(&sample.y)),
                range: GlucoseRange::from_label(&label),
                label,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub total: f64,
    pub by_range: BTreeMap<GlucoseRange, f64>,
}

pub fn summarize(bins: &[HistogramBin]) -> HistogramSummary {
    let mut summary = HistogramSummary::default();
    for bin in bins {
        summary.total += bin.y;
        if let Some(range) = bin.range {
            *summary.by_range.entry(range).or_insert(0.0) += bin.y;
        }
    }
    summary
}
