pub mod csv_store;
pub mod sqlite_store;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::record::JobRecord;

pub use csv_store::CsvStore;
pub use sqlite_store::SqliteStore;

/// Record store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Which backend persists the record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Csv,
    Sqlite,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Csv => f.write_str("csv"),
            StoreBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StoreBackend::Csv),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}', expected csv or sqlite", other)),
        }
    }
}

/// Outcome of one sink merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Records persisted after the merge
    pub total: usize,
    /// Batch records that were new
    pub added: usize,
    /// Records dropped as duplicates
    pub duplicates: usize,
}

/// A persisted record with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: JobRecord,
}

pub const DEFAULT_LIMIT: usize = 50;

/// Listing filter; text filters are case-insensitive substring matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub source: Option<String>,
    pub description: Option<String>,
    pub limit: usize,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            keyword: None,
            location: None,
            source: None,
            description: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

impl JobFilter {
    pub fn matches(&self, record: &JobRecord) -> bool {
        contains_ci(&record.title, &self.keyword)
            && contains_ci(&record.location, &self.location)
            && contains_ci(&record.source, &self.source)
            && contains_ci(&record.description, &self.description)
    }
}

/// Newest first, then by id for a stable order
fn newest_first(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| {
        b.record
            .scraped_at
            .cmp(&a.record.scraped_at)
            .then(a.id.cmp(&b.id))
    });
}

/// Persistent job record set
///
/// `merge` is the sink: it loads what is persisted, appends the batch,
/// drops duplicates by the configured key keeping the first occurrence,
/// and writes the result back.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Every persisted record in storage order; empty when nothing was stored yet
    async fn load(&self) -> Result<Vec<JobRecord>, StoreError>;

    async fn merge(&self, batch: Vec<JobRecord>) -> Result<MergeReport, StoreError>;

    /// Filtered listing, newest first, at most `filter.limit` records
    async fn search(&self, filter: &JobFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let mut matching: Vec<StoredRecord> = self
            .load()
            .await?
            .into_iter()
            .zip(1..)
            .filter(|(record, _)| filter.matches(record))
            .map(|(record, id)| StoredRecord { id, record })
            .collect();

        newest_first(&mut matching);
        matching.truncate(filter.limit);
        Ok(matching)
    }

    async fn get(&self, id: i64) -> Result<Option<StoredRecord>, StoreError> {
        let Some(index) = usize::try_from(id).ok().and_then(|id| id.checked_sub(1)) else {
            return Ok(None);
        };
        Ok(self
            .load()
            .await?
            .into_iter()
            .nth(index)
            .map(|record| StoredRecord { id, record }))
    }

    /// Check that the backing storage is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Open the store selected by the configuration
pub async fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>, StoreError> {
    info!(
        "Opening {} record store (dedup key: {})",
        config.store_backend, config.dedup_key
    );

    let store: Arc<dyn RecordStore> = match config.store_backend {
        StoreBackend::Csv => Arc::new(CsvStore::new(&config.csv_path, config.dedup_key)),
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::connect(&config.database_url, config.max_db_connections, config.dedup_key).await?,
        ),
    };
    Ok(store)
}
