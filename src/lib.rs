pub mod accounting;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod reporter;
pub mod retry;
pub mod types;

/// ChainPulse API base URL (x402-metered, pay per request)
pub const API_BASE: &str = "https://api.chainpulse.xyz";

/// Environment variable holding the hex-encoded payment key.
/// Overrides the key stored in `config.toml` when set.
pub const PRIVATE_KEY_VAR: &str = "CHAINPULSE_PRIVATE_KEY";

/// Default chain slug for smart-money endpoints.
pub const DEFAULT_CHAIN: &str = "ethereum";

/// Default probe token: WETH on mainnet (high smart-money activity)
pub const DEFAULT_TOKEN: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

/// Default probe wallet: a high-volume DEX trader
pub const DEFAULT_WALLET: &str = "0x4f2083f5fbede34c2714affb3105539775f7fe64";
