//! setup-account — First-time setup for the ChainPulse probes.
//!
//! Validates the private key, prints the payer address it settles from,
//! and saves the key to `config.toml` (created with defaults if missing).
//!
//! By default, reads the private key interactively (hidden input) to avoid
//! leaking it into shell history. Use `--private-key` only for scripted/CI
//! use. There is no remote validation step: under per-request payment every
//! call costs money, so the first probe run doubles as the live check.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;

use chainpulse_probe::auth::{LocalSigner, PaymentSigner};
use chainpulse_probe::config::{AccountConfig, AppConfig, CONFIG_PATH};

#[derive(Parser)]
#[command(
    name = "setup-account",
    about = "Validate the payment key and save it to config.toml"
)]
struct Cli {
    /// Hex-encoded private key (with or without 0x prefix).
    /// If omitted, reads interactively with hidden input (recommended).
    #[arg(long)]
    private_key: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = Path::new(CONFIG_PATH);

    let mut app_config = AppConfig::load_or_default(config_path)?;

    println!("=== ChainPulse Probes — Account Setup ===\n");

    // ── Step 1: Read private key ───────────────────────────────────
    let private_key = match cli.private_key {
        Some(key) => key,
        None => {
            let key = rpassword::prompt_password("Enter private key (hex): ")
                .context("failed to read private key")?;
            if key.trim().is_empty() {
                bail!("private key cannot be empty");
            }
            key.trim().to_string()
        }
    };

    // ── Step 2: Validate private key ───────────────────────────────
    println!("Validating private key...");
    let signer = LocalSigner::from_hex(&private_key)
        .context("invalid private key — expected hex-encoded (with or without 0x prefix)")?;
    println!("  Payer address: {}", signer.address());
    println!();

    // ── Step 3: Save key to config.toml ────────────────────────────
    println!("Updating {}...", config_path.display());
    app_config.account = Some(AccountConfig { private_key });
    app_config.save(config_path)?;
    println!("  Config updated successfully");
    println!();

    // ── Summary ────────────────────────────────────────────────────
    println!("=== Setup Complete ===");
    println!();
    println!("Fund {} with USDC on Base to pay for requests.", signer.address());
    println!();
    println!("Next steps:");
    println!("  cargo run --bin probe_netflows");
    println!("  cargo run --bin probe_wallet -- <wallet_address>");

    Ok(())
}
