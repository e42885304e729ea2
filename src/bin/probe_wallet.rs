//! Probe: profiler balances and DEX trades for one wallet, in parallel.
//!
//! The two lookups are independent, so they run as a bounded pair: start
//! both, wait for both, and let either branch fail without dragging the
//! other down. A missing branch is printed as an explicit marker.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use chainpulse_probe::auth::LocalSigner;
use chainpulse_probe::client::PaidClient;
use chainpulse_probe::config::{AppConfig, CONFIG_PATH};
use chainpulse_probe::retry::Orchestrator;
use chainpulse_probe::{API_BASE, DEFAULT_WALLET, api, reporter};

#[derive(Parser)]
#[command(name = "probe_wallet", about = "Wallet balances and DEX trades, fetched in parallel")]
struct Args {
    /// Wallet address to profile (defaults to a known high-volume trader)
    wallet: Option<String>,
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
    let wallet = args.wallet.unwrap_or_else(|| DEFAULT_WALLET.to_string());

    let config = AppConfig::load_or_default(Path::new(CONFIG_PATH))?;
    let signer = LocalSigner::from_hex(&config.private_key()?)?;
    let client = PaidClient::new(API_BASE, signer)?;
    info!("payer: {}", client.payer());

    let orch = Orchestrator::new(client).with_pacing(config.pacing.interval());
    let policy = config.retry.policy();

    let balances_ep = api::wallet_balances(&wallet);
    let trades_ep = api::wallet_dex_trades(&wallet, 50);
    let (balances, trades) = orch
        .execute_pair(
            (&balances_ep, "wallet balances"),
            (&trades_ep, "wallet dex trades"),
            policy,
        )
        .await;

    match &balances {
        Some(result) => reporter::report_result("wallet balances", result),
        None => reporter::report_missing("wallet balances"),
    }
    match &trades {
        Some(result) => reporter::report_result("wallet dex trades", result),
        None => reporter::report_missing("wallet dex trades"),
    }

    reporter::report_cost_summary(&orch.accounting().summary());

    if balances.is_none() && trades.is_none() {
        bail!("both profiler endpoints failed");
    }
    Ok(())
}
