use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{Instrument, info, info_span};

use crate::bars::{to_stacked_bars, totals_from_table1};
use crate::cancel::CancelToken;
use crate::catalog::{CatalogEntry, CatalogFilter};
use crate::config::SourcePaths;
use crate::detail::{DatasetDetail, build};
use crate::error::CatalogError;
use crate::matcher::{candidate_names, match_record};
use crate::names::slug;
use crate::records::CardRecord;
use crate::sources::{
    SourceFetcher, load_cards, load_glossary, load_histograms, load_table1, load_time_in_range,
};

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub total: usize,
    pub datasets: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink: Send + Sync {
    fn event(&self, event: ProgressEvent);
}

/// Resolves dataset ids against one set of static sources. Holds no state
/// between calls, so concurrent resolutions never share loaded data.
pub struct Resolver<F: SourceFetcher> {
    fetcher: F,
    paths: SourcePaths,
}

impl<F: SourceFetcher> Resolver<F> {
    pub fn new(fetcher: F, paths: SourcePaths) -> Self {
        Self { fetcher, paths }
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }

    pub async fn resolve(
        &self,
        dataset_id: &str,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<DatasetDetail, CatalogError> {
        let span = info_span!("resolve", dataset = dataset_id);
        self.resolve_inner(dataset_id, cancel, sink)
            .instrument(span)
            .await
    }

    async fn resolve_inner(
        &self,
        dataset_id: &str,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<DatasetDetail, CatalogError> {
        sink.event(ProgressEvent {
            message: "phase=Load; fetching static sources".to_string(),
            elapsed: None,
        });
        let start = Instant::now();
        let fetcher: &dyn SourceFetcher = &self.fetcher;
        let paths = &self.paths;

        let (cards, (table1, glossary, histograms, time_in_range)) = tokio::try_join!(
            load_cards(fetcher, &paths.cards, cancel),
            async {
                let (table1, glossary, histograms, time_in_range) = tokio::join!(
                    load_table1(fetcher, &paths.table1, cancel),
                    load_glossary(fetcher, &paths.glossary, cancel),
                    load_histograms(fetcher, &paths.histogram, cancel),
                    load_time_in_range(fetcher, &paths.time_in_range, cancel),
                );
                Ok::<_, CatalogError>((table1?, glossary?, histograms?, time_in_range?))
            }
        )?;
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        sink.event(ProgressEvent {
            message: format!(
                "phase=Load; cards={} table1={} glossary={} histogram={} tir={}",
                cards.len(),
                table1.is_some(),
                glossary.is_some(),
                histograms.is_some(),
                time_in_range.is_some()
            ),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: format!("phase=Match; {dataset_id}"),
            elapsed: None,
        });
        let card = find_card(&cards, dataset_id)
            .ok_or_else(|| CatalogError::DatasetNotFound(dataset_id.to_string()))?;

        let table1_candidates = candidate_names(&card.title, None, dataset_id);
        let table1 = table1
            .as_deref()
            .and_then(|records| match_record(dataset_id, &table1_candidates, records));

        let candidates =
            candidate_names(&card.title, table1.map(|record| record.name.as_str()), dataset_id);
        let histogram = histograms
            .as_deref()
            .and_then(|series| match_record(dataset_id, &candidates, series));
        let totals = table1.map(totals_from_table1).unwrap_or_default();
        let bars = time_in_range
            .as_deref()
            .and_then(|entries| match_record(dataset_id, &candidates, entries))
            .map(|entry| to_stacked_bars(&entry.table, Some(&totals)));

        sink.event(ProgressEvent {
            message: "phase=Build; assembling detail".to_string(),
            elapsed: None,
        });
        let detail = build(card, table1, glossary.as_ref(), histogram, bars);
        info!(
            dataset = detail.title.as_str(),
            table1 = table1.is_some(),
            histogram = histogram.is_some(),
            bars = detail.time_in_ranges.len(),
            "resolved dataset detail"
        );
        Ok(detail)
    }

    /// Card list view, optionally narrowed by the filter bar selections.
    pub async fn list(
        &self,
        filter: &CatalogFilter,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<ListResult, CatalogError> {
        sink.event(ProgressEvent {
            message: "phase=Load; fetching card list".to_string(),
            elapsed: None,
        });
        let cards = load_cards(&self.fetcher, &self.paths.cards, cancel).await?;
        let datasets = cards
            .iter()
            .map(CatalogEntry::from)
            .filter(|entry| filter.matches(entry))
            .collect::<Vec<_>>();
        Ok(ListResult {
            total: cards.len(),
            datasets,
        })
    }
}

/// Cards are keyed by exact title, later duplicates winning. The URL slug of
/// a title is accepted too.
pub fn find_card<'a>(cards: &'a [CardRecord], dataset_id: &str) -> Option<&'a CardRecord> {
    let dataset_id = dataset_id.trim();
    cards
        .iter()
        .rev()
        .find(|card| card.title == dataset_id)
        .or_else(|| {
            let wanted = slug(dataset_id);
            cards.iter().find(|card| slug(&card.title) == wanted)
        })
}

pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn event(&self, _event: ProgressEvent) {}
}
