use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::{FromRequest, Outcome};
use rocket::{Data, Request, Response};
use std::time::Instant;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "X-Request-Id";
const MAX_REQUEST_ID_LEN: usize = 128;

struct RequestMeta {
    start: Instant,
    request_id: String,
    span: tracing::Span,
}

impl RequestMeta {
    fn untracked() -> Self {
        Self {
            start: Instant::now(),
            request_id: "unknown".to_string(),
            span: tracing::Span::none(),
        }
    }
}

/// Opens a tracing span per request and logs its completion.
pub struct RequestLogger;

/// The current request's span, for instrumenting handler futures.
pub struct TracingSpan(pub tracing::Span);

/// Keeps a caller-supplied id made of `[A-Za-z0-9._:-]` (what load balancers
/// and edge platforms put in `X-Request-Id`), otherwise mints a UUID v4.
fn request_id_from(header: Option<&str>) -> String {
    header
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LEN
                && id
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'-'))
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub(crate) fn request_span_for(req: &Request<'_>) -> tracing::Span {
    req.local_cache(RequestMeta::untracked).span.clone()
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for TracingSpan {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(TracingSpan(request_span_for(req)))
    }
}

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, req: &mut Request<'_>, _data: &mut Data<'_>) {
        let request_id = request_id_from(req.headers().get_one(REQUEST_ID_HEADER));
        let span = tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        );
        span.in_scope(|| tracing::debug!("request started"));
        req.local_cache(|| RequestMeta {
            start: Instant::now(),
            request_id,
            span,
        });
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let meta = req.local_cache(RequestMeta::untracked);
        let duration_ms = meta.start.elapsed().as_secs_f64() * 1000.0;
        let status = res.status().code;

        meta.span.in_scope(|| match status {
            500.. => tracing::error!(status, duration_ms, "request completed"),
            400..=499 => tracing::warn!(status, duration_ms, "request completed"),
            _ => tracing::info!(status, duration_ms, "request completed"),
        });

        res.set_header(Header::new(REQUEST_ID_HEADER, meta.request_id.clone()));
    }
}
