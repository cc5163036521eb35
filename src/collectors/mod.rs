pub mod careerjet;
pub mod canton_bern;
pub mod fetcher;
pub mod html;
pub mod ictjobs;
pub mod indeed;
pub mod jobagent;
pub mod jobs_ch;
pub mod jobscout24;

use chrono::NaiveDateTime;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::record::{self, truncate_description, JobRecord, Source};

pub use fetcher::{FetchError, HttpFetcher, PageFetcher};

/// Search terms handed to a collector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            location: location.into(),
        }
    }
}

/// A job posting as extracted from a result page, before tagging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Posting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub description: String,
}

impl Posting {
    fn into_record(self, source: Source, scraped_at: NaiveDateTime, max_len: usize) -> JobRecord {
        JobRecord::new(source, self.title, self.link, scraped_at)
            .with_company(self.company)
            .with_location(self.location)
            .with_description(truncate_description(&self.description, max_len))
    }
}

/// Site-specific knowledge: where the result pages are and how to read them
pub trait Collector: Send + Sync {
    fn source(&self) -> Source;

    /// URL of the 1-based result page `page`, `None` once there are no more pages
    fn page_url(&self, query: &SearchQuery, page: u32) -> Option<String>;

    /// Postings on one result page; links must be absolute
    fn extract(&self, html: &str, query: &SearchQuery) -> Vec<Posting>;

    /// Whether an empty page ends collection; fixed URL lists keep going
    fn stops_on_empty_page(&self, _query: &SearchQuery) -> bool {
        true
    }
}

/// Knobs for a single collection run
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub max_pages: u32,
    pub page_delay: Duration,
    pub description_max_len: usize,
    pub fetch_descriptions: bool,
    pub description_fetch_limit: usize,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_delay: Duration::from_secs(2),
            description_max_len: 5000,
            fetch_descriptions: false,
            description_fetch_limit: 10,
        }
    }
}

/// Page through one source until a page comes back empty
///
/// A failed fetch ends collection for this source; whatever was gathered
/// up to that point is still returned.
pub async fn collect(
    collector: &dyn Collector,
    fetcher: &dyn PageFetcher,
    query: &SearchQuery,
    options: &CollectOptions,
) -> Vec<JobRecord> {
    let source = collector.source();
    let mut records = Vec::new();

    for page in 1..=options.max_pages {
        let Some(url) = collector.page_url(query, page) else {
            break;
        };

        info!("[{}] {} / {} page {}", source, query.keyword, query.location, page);

        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("[{}] Failed to load {}: {}", source, url, e);
                break;
            }
        };

        let postings: Vec<Posting> = collector
            .extract(&html, query)
            .into_iter()
            .filter(|posting| {
                let complete = !posting.title.is_empty() && !posting.link.is_empty();
                if !complete {
                    debug!("[{}] Skipping posting without title or link: {:?}", source, posting);
                }
                complete
            })
            .collect();
        info!("[{}] Found {} jobs on page {}", source, postings.len(), page);

        if postings.is_empty() && collector.stops_on_empty_page(query) {
            info!("[{}] No more results, stopping pagination", source);
            break;
        }

        let scraped_at = record::now();
        records.extend(
            postings
                .into_iter()
                .map(|posting| posting.into_record(source, scraped_at, options.description_max_len)),
        );

        if page < options.max_pages && !options.page_delay.is_zero() {
            sleep(options.page_delay).await;
        }
    }

    if options.fetch_descriptions {
        fill_descriptions(&mut records, fetcher, options).await;
    }

    info!("[{}] Collected {} jobs", source, records.len());
    records
}

/// Fetch detail pages for records that came without a description
async fn fill_descriptions(records: &mut [JobRecord], fetcher: &dyn PageFetcher, options: &CollectOptions) {
    let pending = records
        .iter_mut()
        .filter(|record| record.description.is_empty())
        .take(options.description_fetch_limit);

    for record in pending {
        match fetcher.fetch(&record.link).await {
            Ok(html) => {
                record.description = html::extract_description(&html, options.description_max_len);
                debug!("Fetched description for {} ({} chars)", record.link, record.description.len());
            }
            Err(e) => warn!("Failed to load description for {}: {}", record.link, e),
        }

        if !options.page_delay.is_zero() {
            sleep(options.page_delay).await;
        }
    }
}

/// The collector responsible for `source`
pub fn collector_for(source: Source) -> Box<dyn Collector> {
    match source {
        Source::JobsCh => Box::new(jobs_ch::JobsCh),
        Source::Indeed => Box::new(indeed::Indeed),
        Source::JobScout24 => Box::new(jobscout24::JobScout24),
        Source::JobAgent => Box::new(jobagent::JobAgent),
        Source::CareerJet => Box::new(careerjet::CareerJet),
        Source::CantonBern => Box::new(canton_bern::CantonBern),
        Source::Steze => Box::new(canton_bern::Steze),
        Source::IctJobs => Box::new(ictjobs::IctJobs),
    }
}

#[cfg(test)]
mod tests {
    use super::fetcher::fixtures::FixtureFetcher;
    use super::*;

    fn options() -> CollectOptions {
        CollectOptions {
            page_delay: Duration::ZERO,
            ..CollectOptions::default()
        }
    }

    /// Two result pages followed by an empty one
    struct Paged;

    impl Collector for Paged {
        fn source(&self) -> Source {
            Source::JobScout24
        }

        fn page_url(&self, _query: &SearchQuery, page: u32) -> Option<String> {
            Some(format!("https://example.ch/jobs?page={page}"))
        }

        fn extract(&self, html: &str, _query: &SearchQuery) -> Vec<Posting> {
            html.lines()
                .filter(|line| !line.is_empty())
                .map(|line| Posting {
                    title: line.to_string(),
                    link: format!("https://example.ch/job/{line}"),
                    ..Posting::default()
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn empty_page_stops_pagination() {
        let fetcher = FixtureFetcher::default()
            .with_page("https://example.ch/jobs?page=1", "a\nb")
            .with_page("https://example.ch/jobs?page=2", "c")
            .with_page("https://example.ch/jobs?page=3", "")
            .with_page("https://example.ch/jobs?page=4", "d");

        let records = collect(&Paged, &fetcher, &SearchQuery::default(), &options()).await;

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert_eq!(fetcher.requested().len(), 3);
        assert!(records.iter().all(|r| r.source == "jobscout24.ch"));
    }

    #[tokio::test]
    async fn fetch_error_ends_source_but_keeps_collected() {
        let fetcher = FixtureFetcher::default().with_page("https://example.ch/jobs?page=1", "a");

        let records = collect(&Paged, &fetcher, &SearchQuery::default(), &options()).await;

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn max_pages_bounds_collection() {
        let fetcher = FixtureFetcher::default()
            .with_page("https://example.ch/jobs?page=1", "a")
            .with_page("https://example.ch/jobs?page=2", "b");
        let options = CollectOptions {
            max_pages: 1,
            ..options()
        };

        let records = collect(&Paged, &fetcher, &SearchQuery::default(), &options).await;

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requested(), ["https://example.ch/jobs?page=1"]);
    }

    #[tokio::test]
    async fn descriptions_are_fetched_up_to_limit() {
        let description = "Wir suchen eine engagierte Person. ".repeat(10);
        let fetcher = FixtureFetcher::default()
            .with_page("https://example.ch/jobs?page=1", "a\nb")
            .with_page("https://example.ch/jobs?page=2", "")
            .with_page(
                "https://example.ch/job/a",
                &format!("<html><body><article>{description}</article></body></html>"),
            );
        let options = CollectOptions {
            fetch_descriptions: true,
            description_fetch_limit: 1,
            description_max_len: 40,
            ..options()
        };

        let records = collect(&Paged, &fetcher, &SearchQuery::default(), &options).await;

        assert_eq!(records[0].description.chars().count(), 40);
        assert!(records[1].description.is_empty());
        assert!(!fetcher.requested().contains(&"https://example.ch/job/b".to_string()));
    }

    #[tokio::test]
    async fn long_descriptions_from_listing_are_truncated() {
        struct WithDescription;

        impl Collector for WithDescription {
            fn source(&self) -> Source {
                Source::IctJobs
            }

            fn page_url(&self, _query: &SearchQuery, page: u32) -> Option<String> {
                (page == 1).then(|| "https://ictjobs.ch/?fs=".to_string())
            }

            fn extract(&self, _html: &str, _query: &SearchQuery) -> Vec<Posting> {
                vec![Posting {
                    title: "Dev".to_string(),
                    link: "https://ictjobs.ch/job/1".to_string(),
                    description: "y".repeat(100),
                    ..Posting::default()
                }]
            }
        }

        let fetcher = FixtureFetcher::default().with_page("https://ictjobs.ch/?fs=", "<html></html>");
        let options = CollectOptions {
            description_max_len: 10,
            ..options()
        };

        let records = collect(&WithDescription, &fetcher, &SearchQuery::default(), &options).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "y".repeat(10));
    }

    #[test]
    fn every_source_has_a_collector() {
        for source in Source::ALL {
            assert_eq!(collector_for(source).source(), source);
        }
    }
}
