use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::record::JobRecord;
use crate::store::StoredRecord;

/// Database representation of a job posting with all fields
#[derive(Debug, FromRow, Serialize)]
pub struct JobRow {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
    pub source: String,
    pub description: String,
    pub scraped_at: NaiveDateTime,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            title: row.title,
            company: row.company,
            location: row.location,
            link: row.link,
            source: row.source,
            description: row.description,
            scraped_at: row.scraped_at,
        }
    }
}

impl From<JobRow> for StoredRecord {
    fn from(row: JobRow) -> Self {
        StoredRecord {
            id: row.id,
            record: row.into(),
        }
    }
}
