//! Endpoint constructors for the ChainPulse catalog.
//!
//! Paths and parameter names only; payload shapes are owned by the remote
//! service and stay opaque to the probes.

use serde_json::Value;

use crate::types::Endpoint;

/// Aggregated smart-money netflows for a token.
pub fn netflows(chain: &str, token: &str) -> Endpoint {
    Endpoint::get("/api/v1/smart-money/netflows")
        .query("chain", chain)
        .query("token", token)
}

/// Current smart-money holdings of a token.
pub fn holdings(chain: &str, token: &str) -> Endpoint {
    Endpoint::get("/api/v1/smart-money/holdings")
        .query("chain", chain)
        .query("token", token)
}

/// Top smart-money wallets ranked by realized PnL.
pub fn leaderboard(chain: &str, limit: u32) -> Endpoint {
    Endpoint::get("/api/v1/smart-money/leaderboard")
        .query("chain", chain)
        .query("limit", limit.to_string())
}

/// Profiler summary for one wallet.
pub fn wallet_summary(address: &str) -> Endpoint {
    Endpoint::get(format!("/api/v1/profiler/address/{address}/summary"))
}

/// Token balances held by one wallet.
pub fn wallet_balances(address: &str) -> Endpoint {
    Endpoint::get(format!("/api/v1/profiler/address/{address}/balances"))
}

/// Recent DEX trades by one wallet.
pub fn wallet_dex_trades(address: &str, limit: u32) -> Endpoint {
    Endpoint::get(format!("/api/v1/profiler/address/{address}/dex-trades"))
        .query("limit", limit.to_string())
}

/// Filtered token screener. Heavy query, POST body carries the filters.
pub fn screener_tokens(chain: &str, filters: Value) -> Endpoint {
    Endpoint::post("/api/v1/screener/tokens", filters).query("chain", chain)
}

/// Trending tokens, the cheap precomputed alternative to the screener.
pub fn screener_trending(chain: &str) -> Endpoint {
    Endpoint::get("/api/v1/screener/trending").query("chain", chain)
}
