use sqlx::{Pool, QueryBuilder, Sqlite};
use tracing::debug;

use crate::db::models::JobRow;
use crate::record::JobRecord;
use crate::store::JobFilter;

const COLUMNS: &str = "id, title, company, location, link, source, description, scraped_at";

/// Escape LIKE wildcards and wrap in `%` for a substring match
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Repository for job posting database operations
pub struct JobRepository;

impl JobRepository {
    /// Every stored job in insertion order
    pub async fn all(pool: &Pool<Sqlite>) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(&format!("SELECT {COLUMNS} FROM jobs ORDER BY id"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
        sqlx::query_as::<_, JobRow>(&format!("SELECT {COLUMNS} FROM jobs WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(pool)
            .await
    }

    /// Insert jobs in a single transaction, ignoring rows whose link already exists
    /// Returns the number of rows inserted
    pub async fn insert_batch(pool: &Pool<Sqlite>, jobs: &[JobRecord]) -> Result<u64, sqlx::Error> {
        if jobs.is_empty() {
            debug!("Insert batch called with empty job list");
            return Ok(0);
        }

        debug!("Starting insert of {} jobs", jobs.len());

        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for job in jobs {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO jobs
                    (title, company, location, link, source, description, scraped_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&job.title)
            .bind(&job.company)
            .bind(&job.location)
            .bind(&job.link)
            .bind(&job.source)
            .bind(&job.description)
            .bind(job.scraped_at)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!("Insert completed: {} of {} rows inserted", inserted, jobs.len());

        Ok(inserted)
    }

    /// Filtered listing, newest first
    pub async fn search(pool: &Pool<Sqlite>, filter: &JobFilter) -> Result<Vec<JobRow>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM jobs WHERE 1 = 1"));

        let conditions = [
            ("title", &filter.keyword),
            ("location", &filter.location),
            ("source", &filter.source),
            ("description", &filter.description),
        ];

        for (column, value) in conditions {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                query
                    .push(format!(" AND {column} LIKE "))
                    .push_bind(like_pattern(value))
                    .push(" ESCAPE '\\'");
            }
        }

        query
            .push(" ORDER BY scraped_at DESC, id ASC LIMIT ")
            .push_bind(i64::try_from(filter.limit).unwrap_or(i64::MAX));

        query.build_query_as::<JobRow>().fetch_all(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("c_sharp"), "%c\\_sharp%");
        assert_eq!(like_pattern("rust"), "%rust%");
    }
}
