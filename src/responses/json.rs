// responses/json.rs
use crate::errors::ServerError;
use crate::responses::ResultResp;
use astra::{Body, ResponseBuilder};
use serde::Serialize;

fn json_builder(status: u16) -> ResponseBuilder {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
}

/// Serialize `value` as the JSON body of a `status` response.
pub fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|_| ServerError::InternalError)?;
    json_builder(status)
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

/// Like `json_response`, also setting a cookie.
pub fn json_response_with_cookie<T: Serialize + ?Sized>(
    status: u16,
    value: &T,
    cookie: String,
) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|_| ServerError::InternalError)?;
    json_builder(status)
        .header("Set-Cookie", cookie)
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}
