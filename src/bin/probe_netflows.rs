//! Probe: smart-money netflows + holdings for one token.
//!
//! Two sequential paid calls against the smart-money platform, paced to
//! respect the shared settlement rate limit, then a cost breakdown.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use chainpulse_probe::auth::LocalSigner;
use chainpulse_probe::client::PaidClient;
use chainpulse_probe::config::{AppConfig, CONFIG_PATH};
use chainpulse_probe::retry::Orchestrator;
use chainpulse_probe::{API_BASE, DEFAULT_CHAIN, DEFAULT_TOKEN, api, reporter};

#[derive(Parser)]
#[command(name = "probe_netflows", about = "Smart-money netflows and holdings for a token")]
struct Args {
    /// Token contract address to query (defaults to WETH)
    token: Option<String>,
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
    let token = args.token.unwrap_or_else(|| DEFAULT_TOKEN.to_string());

    let config = AppConfig::load_or_default(Path::new(CONFIG_PATH))?;
    let signer = LocalSigner::from_hex(&config.private_key()?)?;
    let client = PaidClient::new(API_BASE, signer)?;
    info!("payer: {}", client.payer());

    let orch = Orchestrator::new(client).with_pacing(config.pacing.interval());
    let policy = config.retry.policy();

    let netflows = orch
        .execute(
            &api::netflows(DEFAULT_CHAIN, &token),
            "smart-money netflows",
            policy,
        )
        .await?;
    reporter::report_result("smart-money netflows", &netflows);

    let holdings = orch
        .execute(
            &api::holdings(DEFAULT_CHAIN, &token),
            "smart-money holdings",
            policy,
        )
        .await?;
    reporter::report_result("smart-money holdings", &holdings);

    reporter::report_cost_summary(&orch.accounting().summary());
    Ok(())
}
