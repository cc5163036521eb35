use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::collectors::{self, CollectOptions, PageFetcher};
use crate::sources::{self, SourceEntry};
use crate::store::{MergeReport, RecordStore};

/// Summary of one harvest cycle
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Records collected per source entry, in sources-file order
    pub per_source: Vec<(String, usize)>,
    pub collected: usize,
    /// `None` when nothing was collected or the store rejected the batch
    pub merge: Option<MergeReport>,
}

/// Runs every configured source and hands the combined batch to the store
pub struct Harvester {
    sources_file: PathBuf,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn RecordStore>,
    options: CollectOptions,
}

impl Harvester {
    pub fn new(
        sources_file: impl Into<PathBuf>,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn RecordStore>,
        options: CollectOptions,
    ) -> Self {
        Self {
            sources_file: sources_file.into(),
            fetcher,
            store,
            options,
        }
    }

    /// One pass over the sources file followed by a single store merge
    ///
    /// The sources file is re-read on every cycle so edits take effect
    /// without a restart.
    pub async fn run_cycle(&self) -> CycleReport {
        let entries = sources::load_sources(&self.sources_file);
        if entries.is_empty() {
            warn!("No sources configured in {}, nothing to harvest", self.sources_file.display());
            return CycleReport::default();
        }

        self.run_entries(&entries).await
    }

    pub async fn run_entries(&self, entries: &[SourceEntry]) -> CycleReport {
        info!("=== Starting harvest cycle over {} sources ===", entries.len());

        let mut report = CycleReport::default();
        let mut batch = Vec::new();

        for entry in entries {
            info!("--- Collecting {} ---", entry);

            let collector = collectors::collector_for(entry.site);
            let records = collectors::collect(collector.as_ref(), self.fetcher.as_ref(), &entry.query, &self.options).await;

            report.per_source.push((entry.to_string(), records.len()));
            batch.extend(records);
        }

        report.collected = batch.len();

        if batch.is_empty() {
            warn!("No jobs collected in this cycle");
        } else {
            match self.store.merge(batch).await {
                Ok(merge) => report.merge = Some(merge),
                Err(e) => error!("Failed to persist {} collected jobs: {}", report.collected, e),
            }
        }

        self.log_summary(&report);
        report
    }

    fn log_summary(&self, report: &CycleReport) {
        info!("=== Harvest cycle finished ===");
        for (label, count) in &report.per_source {
            info!("  {}: {} jobs", label, count);
        }
        match &report.merge {
            Some(merge) => info!(
                "  collected {}, {} new, {} duplicates, {} stored in total",
                report.collected, merge.added, merge.duplicates, merge.total
            ),
            None => info!("  collected {}, nothing stored", report.collected),
        }
    }
}
