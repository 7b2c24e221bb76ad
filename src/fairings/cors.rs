use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Request, Response};

pub(crate) const ALLOW_ORIGIN: &str = "*";
pub(crate) const ALLOW_METHODS: &str = "GET, OPTIONS";
pub(crate) const ALLOW_HEADERS: &str = "Content-Type";

/// Stamps the cross-origin headers on every response, including catcher
/// responses and requests that carry no `Origin`.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS Headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", ALLOW_ORIGIN));
        res.set_header(Header::new("Access-Control-Allow-Methods", ALLOW_METHODS));
        res.set_header(Header::new("Access-Control-Allow-Headers", ALLOW_HEADERS));
    }
}
