//! JSON envelope understood by browser wallets' `eth_decrypt`
//!
//! Wallets don't take the compact binary blob; they expect the box split into
//! base64 fields with a version tag. This converts between the two without
//! touching the cryptography.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::channel::{BOX_NONCE_SIZE, MIN_HYBRID_CIPHERTEXT_SIZE};
use super::keys::PUBLIC_KEY_SIZE;

/// The only envelope version wallets implement
pub const ENVELOPE_VERSION: &str = "x25519-xsalsa20-poly1305";

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wallet-facing form of a hybrid ciphertext
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub version: String,
    pub nonce: String,
    pub ephem_public_key: String,
    /// Poly1305 tag followed by the XSalsa20 ciphertext
    pub ciphertext: String,
}

impl EncryptedEnvelope {
    /// Split a compact `epk || nonce || box` blob into envelope fields
    pub fn from_hybrid(blob: &[u8]) -> Result<Self, EnvelopeError> {
        if blob.len() < MIN_HYBRID_CIPHERTEXT_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "hybrid ciphertext too short: {} bytes",
                blob.len()
            )));
        }
        let (epk, rest) = blob.split_at(PUBLIC_KEY_SIZE);
        let (nonce, sealed) = rest.split_at(BOX_NONCE_SIZE);

        Ok(Self {
            version: ENVELOPE_VERSION.to_string(),
            nonce: BASE64.encode(nonce),
            ephem_public_key: BASE64.encode(epk),
            ciphertext: BASE64.encode(sealed),
        })
    }

    /// Reassemble the compact blob accepted by `decrypt_from`
    pub fn to_hybrid(&self) -> Result<Vec<u8>, EnvelopeError> {
        if self.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(self.version.clone()));
        }

        let epk = BASE64.decode(&self.ephem_public_key)?;
        if epk.len() != PUBLIC_KEY_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "ephemeral public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                epk.len()
            )));
        }
        let nonce = BASE64.decode(&self.nonce)?;
        if nonce.len() != BOX_NONCE_SIZE {
            return Err(EnvelopeError::Malformed(format!(
                "nonce must be {} bytes, got {}",
                BOX_NONCE_SIZE,
                nonce.len()
            )));
        }
        let sealed = BASE64.decode(&self.ciphertext)?;

        let mut blob = Vec::with_capacity(PUBLIC_KEY_SIZE + BOX_NONCE_SIZE + sealed.len());
        blob.extend_from_slice(&epk);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{HybridChannel, SecretKey};

    #[test]
    fn test_envelope_field_names() {
        let envelope = EncryptedEnvelope::from_hybrid(&[9u8; MIN_HYBRID_CIPHERTEXT_SIZE]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(json["version"], ENVELOPE_VERSION);
        assert!(json.get("ephemPublicKey").is_some());
        assert!(json.get("nonce").is_some());
        assert!(json.get("ciphertext").is_some());
    }

    #[test]
    fn test_envelope_opens_after_conversion() {
        let key = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let blob = channel.encrypt_to(&key.public(), b"secret").unwrap();

        let json = EncryptedEnvelope::from_hybrid(&blob).unwrap().to_json().unwrap();
        let back = EncryptedEnvelope::from_json(&json).unwrap().to_hybrid().unwrap();

        assert_eq!(blob, back);
        assert_eq!(channel.decrypt_from(&key, &back).unwrap(), b"secret".to_vec());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut envelope =
            EncryptedEnvelope::from_hybrid(&[1u8; MIN_HYBRID_CIPHERTEXT_SIZE]).unwrap();
        envelope.version = "x25519-chacha20-poly1305".to_string();
        assert!(matches!(
            envelope.to_hybrid(),
            Err(EnvelopeError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_rejects_bad_field_lengths() {
        let mut envelope =
            EncryptedEnvelope::from_hybrid(&[1u8; MIN_HYBRID_CIPHERTEXT_SIZE]).unwrap();
        envelope.nonce = BASE64.encode([0u8; 12]);
        assert!(matches!(envelope.to_hybrid(), Err(EnvelopeError::Malformed(_))));

        assert!(EncryptedEnvelope::from_hybrid(&[1u8; PUBLIC_KEY_SIZE]).is_err());
    }
}
