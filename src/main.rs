#[macro_use]
extern crate rocket;

mod catchers;
mod cli;
mod config;
mod error;
mod fairings;
mod routes;
mod telemetry;
#[cfg(test)]
mod test_helpers;
mod types;
mod upstream;

use clap::Parser;
use config::UsageConfig;
use upstream::UsageClient;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(routes::health::get_health, routes::usage::get_usage),
    components(),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Usage", description = "Anthropic API usage relay"),
    ),
    info(
        title = "Usage Proxy",
        version = "0.1.0",
        description = "Relays Anthropic API usage data with a server-side API key",
    )
)]
struct ApiDoc;

fn rocket(config: UsageConfig) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(config)
        .manage(UsageClient::new())
        .mount("/", routes::health::routes())
        .mount("/api/usage", routes::usage::routes())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<tail..>").url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .register("/", catchers::catchers())
        .attach(fairings::RequestLogger)
        .attach(fairings::Cors)
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();
    cli::run(cli::Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use rocket::local::blocking::Client;

    fn client() -> Client {
        let config = UsageConfig::default()
            .with_api_key("sk-test")
            .with_endpoints("http://127.0.0.1:1/v1/usage", "http://127.0.0.1:1/v1/admin/usage");
        Client::tracked(rocket(config)).expect("valid rocket instance")
    }

    #[test]
    fn test_health_endpoint() {
        let client = client();
        let response = client.get("/health").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().unwrap()).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_unknown_route_has_cors_and_request_id() {
        let client = client();
        let response = client.get("/v1/nothing").dispatch();
        assert_eq!(response.status(), Status::NotFound);
        let headers = response.headers();
        assert_eq!(headers.get_one("Access-Control-Allow-Methods"), Some("GET, OPTIONS"));
        assert!(headers.get_one("X-Request-Id").is_some());
        assert_eq!(
            response.into_string().as_deref(),
            Some(r#"{"error":"Not found"}"#)
        );
    }

    #[test]
    fn test_openapi_documents_usage_route() {
        let client = client();
        let response = client.get("/api-doc/openapi.json").dispatch();
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value =
            serde_json::from_str(&response.into_string().unwrap()).unwrap();
        assert!(body["paths"]["/api/usage"]["get"].is_object());
        assert!(body["paths"]["/health"]["get"].is_object());
    }
}
