use serde::Deserialize;
use validator::Validate;

use crate::store::{JobFilter, DEFAULT_LIMIT};

/// Query string of the job listing
#[derive(Deserialize, Debug, Default, Validate)]
pub struct JobQuery {
    /// Substring of the title
    #[validate(length(max = 200, message = "keyword must be at most 200 characters"))]
    pub keyword: Option<String>,

    #[validate(length(max = 200, message = "location must be at most 200 characters"))]
    pub location: Option<String>,

    #[validate(length(max = 200, message = "source must be at most 200 characters"))]
    pub source: Option<String>,

    /// Substring of the description
    #[validate(length(max = 200, message = "description must be at most 200 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<usize>,
}

impl From<JobQuery> for JobFilter {
    fn from(query: JobQuery) -> Self {
        JobFilter {
            keyword: query.keyword,
            location: query.location,
            source: query.source,
            description: query.description,
            limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}
