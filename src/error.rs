use crate::fairings::request_span_for;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{Request, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"error": "Anthropic API error: Forbidden", "details": "forbidden"}))]
pub struct ApiErrorResponse {
    #[schema(example = "Method not allowed")]
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Anthropic API error: {status_text}")]
    Upstream {
        status: u16,
        status_text: String,
        details: String,
    },
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::MethodNotAllowed => Status::MethodNotAllowed,
            ApiError::MissingApiKey => Status::InternalServerError,
            ApiError::Upstream { status, .. } => Status::new(*status),
            ApiError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            ApiError::Upstream { details, .. } | ApiError::Internal(details) => {
                Some(details.as_str())
            }
            ApiError::MethodNotAllowed | ApiError::MissingApiKey => None,
        }
    }

    pub fn body(&self) -> ApiErrorResponse {
        ApiErrorResponse {
            error: self.to_string(),
            details: self.details().map(str::to_string),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        let body = self.body();

        let span = request_span_for(req);
        span.in_scope(|| {
            let details = body.details.as_deref().unwrap_or_default();
            if status.code >= 500 {
                tracing::error!(
                    status = status.code,
                    error_message = %body.error,
                    details = %details,
                    "request failed"
                );
            } else {
                tracing::warn!(
                    status = status.code,
                    error_message = %body.error,
                    details = %details,
                    "request failed"
                );
            }
        });

        let json_response = match Json(body).respond_to(req) {
            Ok(r) => r,
            Err(s) => {
                tracing::error!(status = %s.code, "failed to serialize error response");
                return Err(s);
            }
        };
        Ok(Response::build_from(json_response).status(status).finalize())
    }
}
