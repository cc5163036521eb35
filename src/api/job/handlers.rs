use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{
    get, post,
    web::{Data, Path, ServiceConfig, scope},
    HttpResponse,
};
use actix_web_validator::Query;

use super::models::JobQuery;
use super::service::{JobService, ServiceError};

/// Multipart body of `POST /jobs/import`
#[derive(MultipartForm)]
pub struct ImportUpload {
    /// CSV record file
    file: TempFile,
}

#[get("")]
async fn list_jobs(service: Data<JobService>, query: Query<JobQuery>) -> Result<HttpResponse, ServiceError> {
    let response = service.list_jobs(query.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/{id}")]
async fn get_job(service: Data<JobService>, id: Path<i64>) -> Result<HttpResponse, ServiceError> {
    let job = service.get_job(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(job))
}

#[post("/import")]
async fn import_jobs(
    service: Data<JobService>,
    MultipartForm(upload): MultipartForm<ImportUpload>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.import_file(upload.file.file.path()).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(
        scope("jobs")
            .service(list_jobs)
            .service(import_jobs)
            .service(get_job),
    );
}
