use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::dto::{ImportResponse, JobListResponse};
use crate::api::validation::ErrorResponse;
use crate::import;
use crate::store::{JobFilter, RecordStore, StoreError, StoredRecord};

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Record store operation failed
    Store(StoreError),

    /// Job not found
    NotFound(i64),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Store(e) => write!(f, "Store error: {}", e),
            ServiceError::NotFound(id) => write!(f, "Job not found: {}", id),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Store(StoreError::Csv(e)) => {
                warn!("Rejected unreadable CSV: {}", e);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Invalid CSV file".to_string(),
                    fields: serde_json::json!({"message": e.to_string()}),
                })
            }
            ServiceError::Store(e) => {
                error!("Store error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Store error occurred"}),
                })
            }
            ServiceError::NotFound(id) => {
                warn!("Job not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Job with id {} not found", id)}),
                })
            }
        }
    }
}

/// Job service containing the read and import logic behind the API
pub struct JobService {
    store: Arc<dyn RecordStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Filtered listing, newest first
    pub async fn list_jobs(&self, filter: JobFilter) -> Result<JobListResponse, ServiceError> {
        info!("Service: Listing jobs with {:?}", filter);

        let jobs = self.store.search(&filter).await?;
        Ok(JobListResponse {
            count: jobs.len(),
            jobs,
        })
    }

    pub async fn get_job(&self, id: i64) -> Result<StoredRecord, ServiceError> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    /// Merge an uploaded CSV record file into the store
    pub async fn import_file(&self, path: &Path) -> Result<ImportResponse, ServiceError> {
        info!("Service: Importing uploaded file {}", path.display());

        let report = import::import_csv(path, self.store.as_ref()).await?;
        Ok(report.into())
    }
}
