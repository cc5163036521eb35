use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;
use tracing::info;

use super::{JobFilter, MergeReport, RecordStore, StoreBackend, StoreError, StoredRecord};
use crate::db::{connection, job_repository::JobRepository, migrations};
use crate::dedup::{self, DedupKey};
use crate::record::JobRecord;

/// Record set kept in a SQLite `jobs` table with a unique `link` column
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    key: DedupKey,
    // merges load, dedup and insert in separate statements
    merge_lock: Mutex<()>,
}

impl SqliteStore {
    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32, key: DedupKey) -> Result<Self, StoreError> {
        let pool = connection::get_connection(database_url, max_connections).await?;
        info!("Database connection pool established");

        migrations::run_migrations(&pool).await?;
        Ok(Self::new(pool, key))
    }

    pub fn new(pool: Pool<Sqlite>, key: DedupKey) -> Self {
        Self {
            pool,
            key,
            merge_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }

    async fn load(&self) -> Result<Vec<JobRecord>, StoreError> {
        let rows = JobRepository::all(&self.pool).await?;
        Ok(rows.into_iter().map(JobRecord::from).collect())
    }

    /// Dedup against stored rows by the configured key, then insert the
    /// survivors; the `link` constraint still rejects repeated links.
    async fn merge(&self, batch: Vec<JobRecord>) -> Result<MergeReport, StoreError> {
        let _guard = self.merge_lock.lock().await;
        let batch_len = batch.len();
        let existing = self.load().await?;
        let merged = dedup::merge(existing, batch, self.key);

        let candidates = merged.new_records();
        let inserted = JobRepository::insert_batch(&self.pool, candidates).await? as usize;
        let total = JobRepository::count(&self.pool).await? as usize;

        let report = MergeReport {
            total,
            added: inserted,
            duplicates: batch_len - inserted,
        };

        info!(
            "SQLite store updated: {} new, {} skipped ({} rejected by link constraint), {} total",
            report.added,
            report.duplicates,
            candidates.len() - inserted,
            report.total
        );
        Ok(report)
    }

    async fn search(&self, filter: &JobFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let rows = JobRepository::search(&self.pool, filter).await?;
        Ok(rows.into_iter().map(StoredRecord::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<StoredRecord>, StoreError> {
        let row = JobRepository::find_by_id(&self.pool, id).await?;
        Ok(row.map(StoredRecord::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool...");
        self.pool.close().await;
        info!("Database connections closed");
    }
}
