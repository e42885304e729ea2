use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// An opaque request target: path, method, and parameters.
///
/// Constructed fresh per call; carries no state. Paths and accepted
/// parameters are defined entirely by the remote catalog.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Endpoint {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// The outcome of one successful paid call. Immutable; nothing is cached,
/// every run re-fetches.
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Opaque payload (the response body's `data` field).
    pub data: Value,
    /// Amount actually charged, in the payment asset's display units.
    pub price: Decimal,
    /// Opaque settlement receipt from the response metadata.
    pub settlement: Option<String>,
}

/// Machine-readable price quote carried by the 402 response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    #[serde(default)]
    pub x402_version: u32,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

impl PriceQuote {
    /// First accepted payment option. The probes always pay with the
    /// server's preferred scheme.
    pub fn requirements(&self) -> Result<&PaymentRequirements, ApiError> {
        self.accepts.first().ok_or_else(|| ApiError::ProtocolMismatch {
            detail: "quote offers no payment options".into(),
        })
    }
}

/// One payment option from a quote's `accepts` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    /// Price in base units of `asset`, as a decimal string.
    pub max_amount_required: String,
    #[serde(default)]
    pub resource: String,
    pub pay_to: String,
    pub asset: String,
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub extra: Option<Value>,
}

impl PaymentRequirements {
    /// Payment asset decimals, from the quote's `extra` metadata (USDC-style
    /// 6 when absent).
    pub fn decimals(&self) -> u32 {
        self.extra
            .as_ref()
            .and_then(|e| e.get("decimals"))
            .and_then(Value::as_u64)
            .map(|d| d.min(28) as u32)
            .unwrap_or(6)
    }

    /// Quoted price converted from base units to display units.
    pub fn amount(&self) -> Result<Decimal, ApiError> {
        let mut units: Decimal =
            self.max_amount_required
                .parse()
                .map_err(|_| ApiError::ProtocolMismatch {
                    detail: format!("unparseable quote amount {:?}", self.max_amount_required),
                })?;
        units
            .set_scale(self.decimals())
            .map_err(|_| ApiError::ProtocolMismatch {
                detail: format!("quote amount {:?} out of range", self.max_amount_required),
            })?;
        Ok(units.normalize())
    }
}
