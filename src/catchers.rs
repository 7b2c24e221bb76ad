use crate::error::ApiErrorResponse;
use crate::fairings::request_span_for;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::Catcher;
use rocket::Request;

fn error_body(message: &str) -> Json<ApiErrorResponse> {
    Json(ApiErrorResponse {
        error: message.to_string(),
        details: None,
    })
}

#[catch(404)]
pub fn not_found(req: &Request<'_>) -> Json<ApiErrorResponse> {
    let span = request_span_for(req);
    span.in_scope(|| tracing::warn!("route not found"));

    error_body("Not found")
}

#[catch(500)]
pub fn internal_server_error(req: &Request<'_>) -> Json<ApiErrorResponse> {
    let span = request_span_for(req);
    span.in_scope(|| tracing::error!("unhandled internal server error"));

    error_body("Internal server error")
}

#[catch(default)]
pub fn default_catcher(status: Status, req: &Request<'_>) -> Json<ApiErrorResponse> {
    let span = request_span_for(req);
    span.in_scope(|| tracing::warn!(status = status.code, "request rejected"));

    error_body(status.reason().unwrap_or("Unknown error"))
}

pub fn catchers() -> Vec<Catcher> {
    rocket::catchers![not_found, internal_server_error, default_catcher]
}
