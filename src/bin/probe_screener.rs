//! Probe: token screener with trending fallback.
//!
//! The filtered screener regularly times out under load, so it gets linear
//! backoff and, once its retries are spent, the run routes to the cheaper
//! precomputed trending endpoint instead of giving up outright.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use serde_json::json;
use tracing::info;

use chainpulse_probe::auth::LocalSigner;
use chainpulse_probe::client::PaidClient;
use chainpulse_probe::config::{AppConfig, CONFIG_PATH};
use chainpulse_probe::retry::{FallbackPlan, Orchestrator, RetryPolicy};
use chainpulse_probe::{API_BASE, DEFAULT_CHAIN, api, reporter};

#[derive(Parser)]
#[command(name = "probe_screener", about = "Smart-money token screener with fallback")]
struct Args {
    /// Chain slug (defaults to ethereum)
    chain: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let chain = args.chain.unwrap_or_else(|| DEFAULT_CHAIN.to_string());

    let config = AppConfig::load_or_default(Path::new(CONFIG_PATH))?;
    let signer = LocalSigner::from_hex(&config.private_key()?)?;
    let client = PaidClient::new(API_BASE, signer)?;
    info!("payer: {}", client.payer());

    let orch = Orchestrator::new(client).with_pacing(config.pacing.interval());
    // Escalating delays against the heavy endpoint, whatever the configured
    // default backoff is.
    let policy = RetryPolicy::linear(config.retry.max_retries, Duration::from_secs(5));

    let filters = json!({
        "metric": "smart_money_volume",
        "window": "24h",
        "limit": 20,
    });
    let plan = FallbackPlan::new()
        .push(api::screener_tokens(&chain, filters), "token screener")
        .push(api::screener_trending(&chain), "trending tokens");

    match orch.execute_with_fallback(&plan, policy).await? {
        Some(fetched) => reporter::report_result(&fetched.label, &fetched.result),
        None => {
            reporter::report_cost_summary(&orch.accounting().summary());
            bail!("all screener endpoints exhausted — try again later");
        }
    }

    reporter::report_cost_summary(&orch.accounting().summary());
    Ok(())
}
