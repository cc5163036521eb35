use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::info;

use crate::harvest::Harvester;

/// Background loop running one harvest cycle per interval
pub struct Scheduler {
    harvester: Arc<Harvester>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(harvester: Arc<Harvester>, interval: Duration) -> Self {
        Self { harvester, interval }
    }

    /// Run cycles until a shutdown is signalled
    ///
    /// Cycles never overlap: the next one starts `interval` after the
    /// previous one finished. A shutdown only interrupts the sleep, so a
    /// running cycle always completes and persists its batch.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Scheduler started, running a harvest cycle every {:?}", self.interval);

        let mut cycle = 1u64;
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            info!("Scheduler starting cycle {}", cycle);
            let report = self.harvester.run_cycle().await;
            info!("Scheduler finished cycle {} ({} jobs collected)", cycle, report.collected);
            cycle += 1;

            info!("Next cycle in {:?}", self.interval);
            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown_rx.changed() => {
                    // sender dropped counts as shutdown too
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::fetcher::fixtures::FixtureFetcher;
    use crate::collectors::CollectOptions;
    use crate::dedup::DedupKey;
    use crate::store::{CsvStore, RecordStore};

    fn harvester(dir: &tempfile::TempDir, fetcher: Arc<FixtureFetcher>) -> Arc<Harvester> {
        let sources_file = dir.path().join("sources.txt");
        std::fs::write(&sources_file, "ictjobs.ch|devops|\n").unwrap();

        let store: Arc<dyn RecordStore> = Arc::new(CsvStore::new(dir.path().join("jobs.csv"), DedupKey::Link));
        let options = CollectOptions {
            page_delay: Duration::ZERO,
            ..CollectOptions::default()
        };
        Arc::new(Harvester::new(sources_file, fetcher, store, options))
    }

    #[tokio::test]
    async fn runs_a_cycle_then_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FixtureFetcher::default());
        let scheduler = Scheduler::new(harvester(&dir, fetcher.clone()), Duration::from_secs(3600));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

        // wait for the first cycle to reach the fetcher
        while fetcher.requested().is_empty() {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("scheduler should stop within the sleep")
            .unwrap();
        assert_eq!(fetcher.requested(), vec!["https://ictjobs.ch/?fs=devops"]);
    }

    #[tokio::test]
    async fn does_not_start_when_already_shut_down() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FixtureFetcher::default());
        let scheduler = Scheduler::new(harvester(&dir, fetcher.clone()), Duration::from_secs(3600));
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);

        scheduler.run(shutdown_rx).await;

        assert!(fetcher.requested().is_empty());
    }
}
