use crate::config::{UsageConfig, DEFAULT_FALLBACK_URL, DEFAULT_PRIMARY_URL};
use crate::error::ApiError;
use crate::upstream::UsageClient;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "usage_proxy")]
#[command(about = "Anthropic usage proxy server")]
pub struct Cli {
    #[arg(long, global = true, default_value = DEFAULT_PRIMARY_URL)]
    pub primary_url: String,
    #[arg(long, global = true, default_value = DEFAULT_FALLBACK_URL)]
    pub fallback_url: String,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    #[command(about = "Start the API server (default)")]
    Serve,
    #[command(about = "Fetch usage once and print it to stdout")]
    Fetch,
}

impl Cli {
    pub fn usage_config(&self) -> UsageConfig {
        UsageConfig::default().with_endpoints(&self.primary_url, &self.fallback_url)
    }
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.usage_config();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!(
                primary_url = %config.primary_url,
                fallback_url = %config.fallback_url,
                "starting usage proxy"
            );
            crate::rocket(config).launch().await?;
            Ok(())
        }
        Command::Fetch => {
            let payload = fetch_once(&config).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}

async fn fetch_once(config: &UsageConfig) -> Result<serde_json::Value, ApiError> {
    let api_key = config.api_key.resolve().ok_or(ApiError::MissingApiKey)?;
    let reply = UsageClient::new().fetch(config, &api_key).await?;
    reply.into_result()
}
