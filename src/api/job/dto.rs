use serde::Serialize;

use crate::store::{MergeReport, StoredRecord};

/// Response for the filtered job listing
#[derive(Serialize)]
pub struct JobListResponse {
    pub count: usize,
    pub jobs: Vec<StoredRecord>,
}

/// Response for a CSV import
#[derive(Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub added: usize,
    pub duplicates: usize,
    pub total: usize,
}

impl From<MergeReport> for ImportResponse {
    fn from(report: MergeReport) -> Self {
        ImportResponse {
            message: format!(
                "Import completed. {} added, {} skipped as duplicates",
                report.added, report.duplicates
            ),
            added: report.added,
            duplicates: report.duplicates,
            total: report.total,
        }
    }
}
