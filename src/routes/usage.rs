use crate::config::UsageConfig;
use crate::error::{ApiError, ApiErrorResponse};
use crate::fairings::TracingSpan;
use crate::upstream::UsageClient;
use rocket::http::Method;
use rocket::route::{self, Handler};
use rocket::serde::json::{Json, Value};
use rocket::{Data, Request, Route, State};
use tracing::Instrument;

#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "Usage",
    responses(
        (status = 200, description = "Usage payload relayed verbatim from the Anthropic API"),
        (status = 500, description = "API key not configured or internal failure", body = ApiErrorResponse),
        (status = "default", description = "Error status relayed from the Anthropic API", body = ApiErrorResponse),
    )
)]
#[get("/")]
pub async fn get_usage(
    span: TracingSpan,
    config: &State<UsageConfig>,
    client: &State<UsageClient>,
) -> Result<Json<Value>, ApiError> {
    async move {
        tracing::info!("request received");

        let Some(api_key) = config.api_key.resolve() else {
            tracing::warn!("upstream API key is not configured");
            return Err(ApiError::MissingApiKey);
        };

        let payload = client.fetch(config, &api_key).await?.into_result()?;
        Ok(Json(payload))
    }
    .instrument(span.0)
    .await
}

#[options("/")]
pub fn preflight() {}

/// Every method other than GET and OPTIONS. HEAD is listed so it does not
/// fall through to Rocket's implicit HEAD-as-GET routing.
const REJECTED_METHODS: [Method; 7] = [
    Method::Post,
    Method::Put,
    Method::Patch,
    Method::Delete,
    Method::Head,
    Method::Trace,
    Method::Connect,
];

#[derive(Clone)]
struct RejectMethod;

#[rocket::async_trait]
impl Handler for RejectMethod {
    async fn handle<'r>(&self, req: &'r Request<'_>, _data: Data<'r>) -> route::Outcome<'r> {
        route::Outcome::from(req, ApiError::MethodNotAllowed)
    }
}

pub fn routes() -> Vec<Route> {
    let mut routes = rocket::routes![get_usage, preflight];
    routes.extend(
        REJECTED_METHODS
            .into_iter()
            .map(|method| Route::new(method, "/", RejectMethod)),
    );
    routes
}
