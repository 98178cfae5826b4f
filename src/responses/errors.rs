use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;
use tracing::error;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into the JSON body API clients expect.
/// Infrastructure failures are logged here and reported without detail.
pub fn api_error_response(err: ServerError) -> Response {
    let status = err.status();
    let body = match &err {
        ServerError::Validation(details) => json!({
            "error": "Validation error",
            "details": details,
        }),
        ServerError::NotFound => json!({ "error": "Not found" }),
        ServerError::BadRequest(msg) | ServerError::Unauthorized(msg) => json!({ "error": msg }),
        ServerError::Conflict => json!({ "error": err.to_string() }),
        ServerError::TooManyRequests { .. } => {
            json!({ "error": "Too many requests. Please try again later." })
        }
        ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => {
            error!(error = %err, "request failed");
            json!({ "error": "Internal server error" })
        }
    };

    let mut builder = ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref());
    if let ServerError::TooManyRequests { retry_after_secs } = err {
        builder = builder.header("Retry-After", retry_after_secs.to_string());
    }
    builder
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
