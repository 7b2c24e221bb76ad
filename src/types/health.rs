use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness check body. Reports only that the process is serving; the
/// upstream API is not consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}
