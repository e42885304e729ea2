use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use serde_json::json;
use sha3::{Digest, Keccak256};

use crate::error::ApiError;
use crate::types::PaymentRequirements;

/// Produces the signed `X-PAYMENT` credential for a price quote.
///
/// The orchestration layer never looks behind this seam; settlement
/// mechanics belong to the payment protocol, not to these probes.
#[allow(async_fn_in_trait)]
pub trait PaymentSigner {
    /// Payer address, 0x-prefixed.
    fn address(&self) -> &str;

    /// Sign the quoted payment and return the header value to attach to
    /// the resend.
    async fn sign(&self, requirements: &PaymentRequirements) -> Result<String, ApiError>;
}

/// Signer backed by a local secp256k1 private key.
pub struct LocalSigner {
    key: SigningKey,
    address: String,
}

impl LocalSigner {
    /// Parse a hex-encoded private key (with or without 0x prefix).
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let trimmed = private_key.trim().trim_start_matches("0x");
        let bytes = hex::decode(trimmed).context("private key is not valid hex")?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))?;
        let address = derive_address(&key);
        Ok(Self { key, address })
    }
}

/// Last 20 bytes of the keccak-256 hash of the uncompressed public key.
fn derive_address(key: &SigningKey) -> String {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

impl PaymentSigner for LocalSigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(&self, requirements: &PaymentRequirements) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp();
        let valid_before = now + requirements.max_timeout_seconds.unwrap_or(60) as i64;

        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);

        let authorization = json!({
            "from": self.address,
            "to": requirements.pay_to,
            "value": requirements.max_amount_required,
            "validAfter": now.to_string(),
            "validBefore": valid_before.to_string(),
            "nonce": format!("0x{}", hex::encode(nonce)),
        });

        let message = serde_json::to_vec(&authorization).map_err(|e| ApiError::Signing {
            detail: e.to_string(),
        })?;
        let digest = Keccak256::digest(&message);
        let (sig, recovery) =
            self.key
                .sign_prehash_recoverable(&digest)
                .map_err(|e| ApiError::Signing {
                    detail: e.to_string(),
                })?;
        let signature = format!(
            "0x{}{:02x}",
            hex::encode(sig.to_bytes()),
            recovery.to_byte() + 27
        );

        let envelope = json!({
            "x402Version": 1,
            "scheme": requirements.scheme,
            "network": requirements.network,
            "payload": {
                "signature": signature,
                "authorization": authorization,
            },
        });
        let bytes = serde_json::to_vec(&envelope).map_err(|e| ApiError::Signing {
            detail: e.to_string(),
        })?;
        Ok(BASE64.encode(bytes))
    }
}
