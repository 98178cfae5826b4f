use crate::errors::ServerError;
use crate::templates::desktop_layout;
use astra::{Body, Response, ResponseBuilder};
use maud::html;
use tracing::error;

/// Convert a ServerError into an HTML error page
pub fn html_error_response(err: ServerError) -> Response {
    let status = err.status();
    let message = match &err {
        ServerError::NotFound => "Not Found".to_string(),
        ServerError::BadRequest(msg) | ServerError::Unauthorized(msg) => msg.clone(),
        ServerError::Validation(errors) => errors.to_string(),
        ServerError::Conflict | ServerError::TooManyRequests { .. } => err.to_string(),
        ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => {
            error!(error = %err, "page request failed");
            "Internal Server Error".to_string()
        }
    };

    let page = desktop_layout(
        &format!("Error {status}"),
        None,
        html! {
            main class="container narrow" {
                h1 { "Error " (status) }
                p { (message) }
                @if status == 401 {
                    p { a href="/signin" { "Sign in" } }
                } @else {
                    p { a href="/leads" { "← Back to leads" } }
                }
            }
        },
    );

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::TEXT_HTML_UTF_8.as_ref())
        .body(Body::from(page.into_string()))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
