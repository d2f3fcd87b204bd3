use std::io::{self, Write};

use serde::Serialize;

use crate::detail::DatasetDetail;
use crate::histogram::summarize;
use crate::resolver::{ListResult, ProgressEvent, ProgressSink};
use crate::sanitize::format_count;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_detail(result: &DatasetDetail) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_detail(detail: &DatasetDetail) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} ({})", detail.title, detail.id)?;
        if !detail.metadata.is_empty() {
            writeln!(out, "  {}", detail.metadata)?;
        }
        if !detail.duration.is_empty() {
            writeln!(out, "  {}", detail.duration)?;
        }
        if !detail.full_description.is_empty() {
            writeln!(out, "\n{}", detail.full_description)?;
        }

        writeln!(out, "\nPopulation: {} participants", format_count(detail.participants_total))?;
        for group in &detail.population_groups {
            writeln!(out, "  {:<6} {}", group.kind, format_count(group.count))?;
        }
        let demographics = &detail.demographics;
        for (label, value) in [
            ("Gender", &demographics.gender),
            ("Ethnicities", &demographics.ethnicities),
            ("Age range", &demographics.age_range),
        ] {
            if !value.is_empty() {
                writeln!(out, "  {label}: {value}")?;
            }
        }

        writeln!(out, "\nData sources:")?;
        for source in &detail.data_sources {
            if source.detail.is_empty() {
                writeln!(out, "  [{}] {}", source.icon, source.name)?;
            } else {
                writeln!(out, "  [{}] {}: {}", source.icon, source.name, source.detail)?;
            }
        }

        let cgm = &detail.cgm_summary;
        writeln!(out, "\nCGM:")?;
        if !cgm.device.is_empty() {
            writeln!(out, "  device: {}", cgm.device)?;
        }
        if !cgm.total_days_range.is_empty() {
            writeln!(out, "  total days: {}", cgm.total_days_range)?;
        }
        writeln!(out, "  glucose samples: {}", format_count(cgm.glucose_samples))?;
        writeln!(
            out,
            "  avg days/participant: {}",
            format_count(cgm.avg_days_per_participant)
        )?;

        writeln!(out, "\nTime in range (%):")?;
        for bar in &detail.time_in_ranges {
            let values = bar
                .segments
                .iter()
                .map(|segment| format_count(segment.value))
                .collect::<Vec<_>>()
                .join(" / ");
            writeln!(
                out,
                "  {:<6} total={} {}",
                bar.group,
                format_count(bar.total),
                values
            )?;
        }
        if !detail.histogram.is_empty() {
            let summary = summarize(&detail.histogram);
            writeln!(
                out,
                "\nHistogram: {} bins, {} readings",
                detail.histogram.len(),
                format_count(summary.total)
            )?;
            for (range, count) in &summary.by_range {
                writeln!(
                    out,
                    "  {:<18} {:<12} {}",
                    range.title(),
                    range.band(),
                    format_count(*count)
                )?;
            }
        }
        if !detail.dataset_link.is_empty() {
            writeln!(out, "\n{}: {}", detail.actions.paper_label, detail.dataset_link)?;
        }
        Ok(())
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for entry in &result.datasets {
            writeln!(out, "{:<24} {}", entry.title, entry.metadata)?;
        }
        writeln!(out, "{} of {} datasets", result.datasets.len(), result.total)?;
        Ok(())
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("{}", event.message),
        }
    }
}
