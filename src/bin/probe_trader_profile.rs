//! Probe: smart-money leaderboard, then profile the top wallets.
//!
//! Step two's requests are built from step one's payload, so the calls are
//! strictly ordered. Any fatal failure ends the run; everything already
//! fetched has been paid for either way.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use chainpulse_probe::auth::LocalSigner;
use chainpulse_probe::client::PaidClient;
use chainpulse_probe::config::{AppConfig, CONFIG_PATH};
use chainpulse_probe::retry::Orchestrator;
use chainpulse_probe::{API_BASE, DEFAULT_CHAIN, api, reporter};

/// Leaderboard entries to profile in depth.
const PROFILE_COUNT: usize = 3;

#[derive(Parser)]
#[command(
    name = "probe_trader_profile",
    about = "Leaderboard top wallets, profiled one by one"
)]
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
    let policy = config.retry.policy();

    let leaderboard = orch
        .execute(
            &api::leaderboard(&chain, 25),
            "smart-money leaderboard",
            policy,
        )
        .await?;
    reporter::report_result("smart-money leaderboard", &leaderboard);

    let wallets: Vec<String> = leaderboard
        .data
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.get("address").and_then(Value::as_str))
                .map(str::to_string)
                .take(PROFILE_COUNT)
                .collect()
        })
        .unwrap_or_default();

    if wallets.is_empty() {
        warn!("leaderboard returned no wallet addresses");
    }

    for wallet in &wallets {
        let label = format!("profile {wallet}");
        let profile = orch.execute(&api::wallet_summary(wallet), &label, policy).await?;
        reporter::report_result(&label, &profile);
    }

    reporter::report_cost_summary(&orch.accounting().summary());
    Ok(())
}
