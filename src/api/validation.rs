use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

fn bad_request(error: &str, fields: serde_json::Map<String, serde_json::Value>) -> actix_web::Error {
    let error_response = ErrorResponse {
        error: error.to_string(),
        fields: serde_json::Value::Object(fields),
    };
    actix_web::error::InternalError::from_response("", HttpResponse::BadRequest().json(error_response)).into()
}

/// Shared error handler turning extractor failures into an `ErrorResponse`
fn validation_error(err: actix_web_validator::Error) -> actix_web::Error {
    let mut fields = serde_json::Map::new();

    match err {
        actix_web_validator::Error::Validate(validation_errors) => {
            for (field, errors) in validation_errors.field_errors() {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Validation error in field: {}", field))
                    })
                    .collect();
                fields.insert(field.to_string(), serde_json::json!({"errors": messages}));
            }

            bad_request("Validation failed", fields)
        }
        actix_web_validator::Error::Deserialize(de_err) => {
            fields.insert(
                "message".to_string(),
                serde_json::json!(format!("Invalid query parameters: {}", de_err)),
            );
            bad_request("Request validation failed", fields)
        }
        _ => {
            fields.insert("message".to_string(), serde_json::json!("Validation error"));
            bad_request("Validation failed", fields)
        }
    }
}

/// Creates a configured QueryConfig with standardized error handling for the entire project
pub fn query_config() -> actix_web_validator::QueryConfig {
    actix_web_validator::QueryConfig::default().error_handler(|err, _req| validation_error(err))
}
