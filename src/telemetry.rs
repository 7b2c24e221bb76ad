use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "usage_proxy=info,rocket=warn,warn";

static TELEMETRY_INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the filter and
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init() {
    TELEMETRY_INIT.call_once(|| {
        if let Err(err) = tracing_log::LogTracer::init() {
            eprintln!("failed to set log tracer: {err}");
        }

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

        let init_result = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer())
                .try_init(),
        };

        if let Err(err) = init_result {
            eprintln!("failed to initialize tracing subscriber: {err}");
        }
    });
}
