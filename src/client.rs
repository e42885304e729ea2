use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::PaymentSigner;
use crate::error::ApiError;
use crate::types::{CallResult, Endpoint, PriceQuote};

/// Header carrying the signed payment credential on the resend.
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// Header carrying the settlement receipt on the paid response.
pub const SETTLEMENT_HEADER: &str = "X-PAYMENT-RESPONSE";

/// Maximum characters of response body kept for diagnostics. Bodies can be
/// large and full of unrelated noise.
const EXCERPT_MAX: usize = 200;

/// A single paid HTTP call. Implemented by [`PaidClient`]; the orchestrator
/// is generic over this so its retry behavior can be exercised against a
/// scripted double.
#[allow(async_fn_in_trait)]
pub trait PaidRequest {
    async fn send(&self, endpoint: &Endpoint) -> Result<CallResult, ApiError>;
}

/// Client for x402-metered endpoints.
///
/// Performs the two-phase handshake: initial request, HTTP 402 with a price
/// quote, signed resend, success with settlement metadata. Unsuccessful
/// exchanges cost nothing; the protocol only settles on a final success.
pub struct PaidClient<S> {
    http: reqwest::Client,
    base: Url,
    signer: S,
}

impl<S: PaymentSigner> PaidClient<S> {
    pub fn new(base_url: &str, signer: S) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid base URL {base_url}"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            signer,
        })
    }

    /// Payer address used for settlement.
    pub fn payer(&self) -> &str {
        self.signer.address()
    }

    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        payment: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self
            .base
            .join(&endpoint.path)
            .map_err(|e| ApiError::ProtocolMismatch {
                detail: format!("invalid endpoint path {:?}: {e}", endpoint.path),
            })?;

        let mut req = self.http.request(endpoint.method.clone(), url);
        if !endpoint.query.is_empty() {
            req = req.query(&endpoint.query);
        }
        if let Some(body) = &endpoint.body {
            req = req.json(body);
        }
        if let Some(credential) = payment {
            req = req.header(PAYMENT_HEADER, credential);
        }
        Ok(req.send().await?)
    }
}

impl<S: PaymentSigner> PaidRequest for PaidClient<S> {
    async fn send(&self, endpoint: &Endpoint) -> Result<CallResult, ApiError> {
        // Phase 1: bare request; the expected answer is a 402 price quote.
        let resp = self.dispatch(endpoint, None).await?;
        let status = resp.status();
        if status != StatusCode::PAYMENT_REQUIRED {
            if let Some(err) = ApiError::from_transient_status(status.as_u16()) {
                return Err(err);
            }
            return Err(ApiError::ProtocolMismatch {
                detail: format!("expected 402 payment quote, got {status}"),
            });
        }

        let quote: PriceQuote = resp.json().await.map_err(|e| ApiError::ProtocolMismatch {
            detail: format!("unreadable price quote: {e}"),
        })?;
        let requirements = quote.requirements()?;
        let price = requirements.amount()?;
        debug!(
            "{} quoted {} on {} ({})",
            endpoint.path, requirements.max_amount_required, requirements.network, price
        );

        // Phase 2: resend with the signed credential attached.
        let credential = self.signer.sign(requirements).await?;
        let resp = self.dispatch(endpoint, Some(&credential)).await?;
        let status = resp.status();
        if !status.is_success() {
            if let Some(err) = ApiError::from_transient_status(status.as_u16()) {
                return Err(err);
            }
            let excerpt = excerpt(&resp.text().await.unwrap_or_default());
            return Err(ApiError::PaymentRejected {
                status: status.as_u16(),
                excerpt,
            });
        }

        let settlement = resp
            .headers()
            .get(SETTLEMENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body: Value = resp.json().await.map_err(|e| ApiError::ProtocolMismatch {
            detail: format!("unreadable response body: {e}"),
        })?;
        let data = body.get("data").cloned().unwrap_or(body);

        Ok(CallResult {
            data,
            price,
            settlement,
        })
    }
}

/// Bounded excerpt of a response body for error messages.
fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= EXCERPT_MAX {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(EXCERPT_MAX).collect();
        format!("{head}…")
    }
}
