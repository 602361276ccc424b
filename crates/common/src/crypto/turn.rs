//! Per-turn secret derivation
//!
//! The registry bumps a key turn counter whenever the group secret has to rotate.
//! Instead of re-sharing a new random secret on every rotation, the secret active
//! at turn `t` is derived from the project's base secret, so any member holding
//! the base secret can compute it locally:
//!
//! ```text
//! active(t) = derive(base_secret, member_index, t)
//! ```
//!
//! Derivation is a strategy so the KDF can be swapped without touching callers.
//! Outputs for different turns are independent PRF outputs; learning one turn's
//! secret says nothing about any other turn's.

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::secret::{Secret, SECRET_SIZE};

/// HKDF salt separating turn secrets from any other use of the base secret
pub const HKDF_TURN_SALT: &[u8] = b"keyturn/turn-secret/v1";
/// BLAKE3 `derive_key` context for turn secrets
pub const BLAKE3_TURN_CONTEXT: &str = "keyturn 2024-06-01 turn secret v1";

/// Errors that can occur while deriving a turn secret
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("key derivation failed: {0}")]
    Kdf(String),
}

/// Strategy for deriving the secret in effect at a given turn
pub trait TurnDerivation: Send + Sync {
    /// Derive the secret for `(base, member_index, turn)`
    ///
    /// Must be deterministic. `member_index` scopes the secret to a recipient when
    /// the group issues per-member secrets; global rotation passes `0`.
    fn derive_secret(&self, base: &Secret, member_index: u64, turn: u64)
        -> Result<Secret, TurnError>;
}

/// Fixed-width encoding of the derivation inputs, so no two input pairs collide
fn turn_info(member_index: u64, turn: u64) -> [u8; 16] {
    let mut info = [0u8; 16];
    info[..8].copy_from_slice(&member_index.to_be_bytes());
    info[8..].copy_from_slice(&turn.to_be_bytes());
    info
}

/// HKDF-SHA256 over the base secret (default)
///
/// `salt = HKDF_TURN_SALT`, `ikm = base`, `info = member_index_be64 || turn_be64`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HkdfSha256;

impl TurnDerivation for HkdfSha256 {
    fn derive_secret(
        &self,
        base: &Secret,
        member_index: u64,
        turn: u64,
    ) -> Result<Secret, TurnError> {
        let hk = Hkdf::<Sha256>::new(Some(HKDF_TURN_SALT), base.bytes());
        let mut okm = [0u8; SECRET_SIZE];
        hk.expand(&turn_info(member_index, turn), &mut okm)
            .map_err(|e| TurnError::Kdf(e.to_string()))?;
        Ok(Secret::from(okm))
    }
}

/// BLAKE3 in key derivation mode
///
/// `derive_key(BLAKE3_TURN_CONTEXT, base || member_index_be64 || turn_be64)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Keyed;

impl TurnDerivation for Blake3Keyed {
    fn derive_secret(
        &self,
        base: &Secret,
        member_index: u64,
        turn: u64,
    ) -> Result<Secret, TurnError> {
        let mut hasher = blake3::Hasher::new_derive_key(BLAKE3_TURN_CONTEXT);
        hasher.update(base.bytes());
        hasher.update(&turn_info(member_index, turn));
        Ok(Secret::from(*hasher.finalize().as_bytes()))
    }
}

/// Derivation strategy selected at runtime, e.g. from a config file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DerivationKind {
    #[default]
    HkdfSha256,
    Blake3,
}

impl std::str::FromStr for DerivationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hkdf-sha256" => Ok(DerivationKind::HkdfSha256),
            "blake3" => Ok(DerivationKind::Blake3),
            other => Err(format!(
                "unknown derivation: {} (expected hkdf-sha256 or blake3)",
                other
            )),
        }
    }
}

impl std::fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivationKind::HkdfSha256 => write!(f, "hkdf-sha256"),
            DerivationKind::Blake3 => write!(f, "blake3"),
        }
    }
}

impl TurnDerivation for DerivationKind {
    fn derive_secret(
        &self,
        base: &Secret,
        member_index: u64,
        turn: u64,
    ) -> Result<Secret, TurnError> {
        let secret = match self {
            DerivationKind::HkdfSha256 => HkdfSha256.derive_secret(base, member_index, turn)?,
            DerivationKind::Blake3 => Blake3Keyed.derive_secret(base, member_index, turn)?,
        };
        tracing::debug!(kind = ?self, member_index, turn, "derived turn secret");
        Ok(secret)
    }
}

/// Derive the turn secret with the default strategy
pub fn derive_secret(base: &Secret, member_index: u64, turn: u64) -> Result<Secret, TurnError> {
    HkdfSha256.derive_secret(base, member_index, turn)
}
