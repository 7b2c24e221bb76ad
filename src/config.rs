use std::fmt;

pub(crate) const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub(crate) const DEFAULT_PRIMARY_URL: &str = "https://api.anthropic.com/v1/usage";
pub(crate) const DEFAULT_FALLBACK_URL: &str = "https://api.anthropic.com/v1/admin/usage";
pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Where the upstream API key comes from.
///
/// The key is resolved on every request, so rotating the environment value
/// takes effect without restarting the server.
#[derive(Clone)]
pub enum ApiKeySource {
    Env(&'static str),
    #[cfg_attr(not(test), allow(dead_code))]
    Fixed(Option<String>),
}

impl ApiKeySource {
    /// Returns the key, treating an empty value the same as a missing one.
    pub fn resolve(&self) -> Option<String> {
        let key = match self {
            ApiKeySource::Env(var) => std::env::var(var).ok(),
            ApiKeySource::Fixed(key) => key.clone(),
        };
        key.filter(|k| !k.is_empty())
    }
}

impl Default for ApiKeySource {
    fn default() -> Self {
        ApiKeySource::Env(API_KEY_ENV)
    }
}

impl fmt::Debug for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeySource::Env(var) => f.debug_tuple("Env").field(var).finish(),
            ApiKeySource::Fixed(Some(_)) => f.write_str("Fixed(<redacted>)"),
            ApiKeySource::Fixed(None) => f.write_str("Fixed(None)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub api_key: ApiKeySource,
    pub primary_url: String,
    pub fallback_url: String,
    pub anthropic_version: String,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKeySource::default(),
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            anthropic_version: ANTHROPIC_VERSION.to_string(),
        }
    }
}

impl UsageConfig {
    #[cfg(test)]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = ApiKeySource::Fixed(Some(key.into()));
        self
    }

    #[cfg(test)]
    pub fn without_api_key(mut self) -> Self {
        self.api_key = ApiKeySource::Fixed(None);
        self
    }

    pub fn with_endpoints(
        mut self,
        primary: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        self.primary_url = primary.into();
        self.fallback_url = fallback.into();
        self
    }
}
