//! Access grants handed to the registry when a member is admitted
//!
//! An access grant is the hybrid ciphertext of a group secret addressed to one
//! member's public key. The registry stores or relays it as opaque bytes; it is
//! useless without the recipient's private key.
//!
//! # Onboarding
//!
//! 1. The newcomer registers the public key derived from its private key.
//! 2. An existing member, holding the base secret, derives the secret for the
//!    turn after the registry's current one and encrypts it to the newcomer.
//! 3. The registry bumps its turn and records the grant.
//! 4. The newcomer redeems the grant with its private key.
//!
//! The project creator seeds the registry with a grant of the base secret
//! itself, addressed to its own key.

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use super::channel::{ChannelError, HybridChannel, MIN_HYBRID_CIPHERTEXT_SIZE};
use super::envelope::{EncryptedEnvelope, EnvelopeError};
use super::keys::{PublicKey, SecretKey};
use super::secret::{Secret, VaultError};
use super::transform::PayloadTransform;
use super::turn::{TurnDerivation, TurnError};

/// Errors that can occur while issuing or redeeming a grant
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("granted secret is malformed: {0}")]
    Secret(#[from] VaultError),
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("turn derivation failed: {0}")]
    Turn(#[from] TurnError),
    #[error("invalid grant: {0}")]
    Invalid(String),
    #[error("key turn {0} cannot be advanced")]
    TurnOverflow(u64),
}

/// Hybrid ciphertext of a group secret for a single recipient
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 ][ nonce: 24 ][ tag: 16 ][ encoded secret ]
/// ```
///
/// # Examples
///
/// ```ignore
/// let channel = HybridChannel::default();
/// let (grant, turn) = AccessGrant::onboard(
///     &channel, &HkdfSha256, &base_secret, 0, registry_turn, &newcomer_public,
/// )?;
///
/// // the newcomer, later
/// let turn_secret = grant.redeem(&channel, &newcomer_secret)?;
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AccessGrant(Vec<u8>);

impl Serialize for AccessGrant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccessGrant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{Error, Visitor};
        use std::fmt;

        struct GrantVisitor;

        impl<'de> Visitor<'de> for GrantVisitor {
            type Value = AccessGrant;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    formatter,
                    "a byte array or sequence of at least {} bytes",
                    MIN_HYBRID_CIPHERTEXT_SIZE
                )
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: Error,
            {
                AccessGrant::try_from(v).map_err(|_| {
                    E::invalid_length(
                        v.len(),
                        &format!("at least {} bytes", MIN_HYBRID_CIPHERTEXT_SIZE).as_str(),
                    )
                })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = Vec::new();
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                self.visit_bytes(&bytes)
            }
        }

        // Try bytes first (for CBOR/bincode), fallback to seq (for JSON)
        deserializer.deserialize_byte_buf(GrantVisitor)
    }
}

impl TryFrom<&[u8]> for AccessGrant {
    type Error = GrantError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() < MIN_HYBRID_CIPHERTEXT_SIZE {
            return Err(GrantError::Invalid(format!(
                "grant too short, expected at least {}, got {}",
                MIN_HYBRID_CIPHERTEXT_SIZE,
                bytes.len()
            )));
        }
        Ok(AccessGrant(bytes.to_vec()))
    }
}

impl From<AccessGrant> for Vec<u8> {
    fn from(grant: AccessGrant) -> Self {
        grant.0
    }
}

impl AccessGrant {
    /// Grant a secret as-is to `recipient`
    pub fn seal_secret<T: PayloadTransform>(
        channel: &HybridChannel<T>,
        secret: &Secret,
        recipient: &PublicKey,
    ) -> Result<Self, GrantError> {
        let ciphertext = channel.encrypt_to(recipient, secret.bytes())?;
        Ok(AccessGrant(ciphertext))
    }

    /// Grant the secret active at `turn` to `recipient`
    pub fn issue<T, D>(
        channel: &HybridChannel<T>,
        deriver: &D,
        base: &Secret,
        member_index: u64,
        turn: u64,
        recipient: &PublicKey,
    ) -> Result<Self, GrantError>
    where
        T: PayloadTransform,
        D: TurnDerivation + ?Sized,
    {
        let turn_secret = deriver.derive_secret(base, member_index, turn)?;
        tracing::info!(recipient = %recipient, member_index, turn, "issuing access grant");
        Self::seal_secret(channel, &turn_secret, recipient)
    }

    /// Admit a newcomer at the turn following the registry's `current_turn`
    ///
    /// Returns the grant together with the turn it was issued for, which the
    /// registry must adopt as its new key turn.
    pub fn onboard<T, D>(
        channel: &HybridChannel<T>,
        deriver: &D,
        base: &Secret,
        member_index: u64,
        current_turn: u64,
        recipient: &PublicKey,
    ) -> Result<(Self, u64), GrantError>
    where
        T: PayloadTransform,
        D: TurnDerivation + ?Sized,
    {
        let next_turn = current_turn
            .checked_add(1)
            .ok_or(GrantError::TurnOverflow(current_turn))?;
        let grant = Self::issue(channel, deriver, base, member_index, next_turn, recipient)?;
        Ok((grant, next_turn))
    }

    /// Recover the granted secret with the recipient's private key
    ///
    /// # Errors
    ///
    /// Fails with [`ChannelError::DecryptionFailed`] if the grant was addressed to
    /// someone else or was tampered with, and with a secret error if the payload
    /// is not a 32 byte secret.
    pub fn redeem<T: PayloadTransform>(
        &self,
        channel: &HybridChannel<T>,
        recipient_key: &SecretKey,
    ) -> Result<Secret, GrantError> {
        let plaintext = zeroize::Zeroizing::new(channel.decrypt_from(recipient_key, &self.0)?);
        Ok(Secret::from_slice(&plaintext)?)
    }

    /// Parse a grant from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, GrantError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes =
            hex::decode(hex).map_err(|e| GrantError::Invalid(format!("hex decode error: {}", e)))?;
        AccessGrant::try_from(bytes.as_slice())
    }

    /// Convert grant to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Wallet-facing JSON envelope of this grant
    pub fn to_envelope(&self) -> Result<EncryptedEnvelope, GrantError> {
        Ok(EncryptedEnvelope::from_hybrid(&self.0)?)
    }

    pub fn from_envelope(envelope: &EncryptedEnvelope) -> Result<Self, GrantError> {
        let blob = envelope.to_hybrid()?;
        AccessGrant::try_from(blob.as_slice())
    }

    /// Get a reference to the raw grant bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::secret::SECRET_SIZE;
    use crate::crypto::transform::Raw;
    use crate::crypto::turn::{derive_secret, Blake3Keyed, HkdfSha256};

    fn base() -> Secret {
        Secret::from(*b"Initial secret must be 32 bytes.")
    }

    #[test]
    fn test_seal_and_redeem_base_secret() {
        let owner = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();

        let grant = AccessGrant::seal_secret(&channel, &base(), &owner.public()).unwrap();
        assert_eq!(grant.redeem(&channel, &owner).unwrap(), base());
    }

    #[test]
    fn test_onboard_issues_next_turn() {
        let newcomer = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();

        let (grant, turn) =
            AccessGrant::onboard(&channel, &HkdfSha256, &base(), 0, 4, &newcomer.public())
                .unwrap();
        assert_eq!(turn, 5);

        let redeemed = grant.redeem(&channel, &newcomer).unwrap();
        assert_eq!(redeemed, derive_secret(&base(), 0, 5).unwrap());
        assert_ne!(redeemed, derive_secret(&base(), 0, 4).unwrap());
    }

    struct Exhausted;

    impl TurnDerivation for Exhausted {
        fn derive_secret(&self, _: &Secret, _: u64, turn: u64) -> Result<Secret, TurnError> {
            Err(TurnError::Kdf(format!("no secret for turn {}", turn)))
        }
    }

    #[test]
    fn test_derivation_failure_is_returned() {
        let newcomer = SecretKey::generate().unwrap();
        let result = AccessGrant::onboard(
            &HybridChannel::default(),
            &Exhausted,
            &base(),
            0,
            1,
            &newcomer.public(),
        );
        assert!(matches!(result, Err(GrantError::Turn(TurnError::Kdf(_)))));
    }

    #[test]
    fn test_onboard_turn_overflow() {
        let newcomer = SecretKey::generate().unwrap();
        let result = AccessGrant::onboard(
            &HybridChannel::default(),
            &HkdfSha256,
            &base(),
            0,
            u64::MAX,
            &newcomer.public(),
        );
        assert!(matches!(result, Err(GrantError::TurnOverflow(u64::MAX))));
    }

    #[test]
    fn test_redeem_wrong_key() {
        let alice = SecretKey::generate().unwrap();
        let bob = SecretKey::generate().unwrap();
        let channel = HybridChannel::new(Raw);

        let grant =
            AccessGrant::issue(&channel, &Blake3Keyed, &base(), 0, 1, &alice.public()).unwrap();
        assert!(matches!(
            grant.redeem(&channel, &bob),
            Err(GrantError::Channel(ChannelError::DecryptionFailed))
        ));
    }

    #[test]
    fn test_redeem_rejects_wrong_sized_payload() {
        let alice = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let blob = channel.encrypt_to(&alice.public(), &[1u8; SECRET_SIZE - 1]).unwrap();

        let grant = AccessGrant::try_from(blob.as_slice()).unwrap();
        assert!(matches!(
            grant.redeem(&channel, &alice),
            Err(GrantError::Secret(VaultError::InvalidKeyFormat(_)))
        ));
    }

    #[test]
    fn test_grant_hex_roundtrip() {
        let alice = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let grant = AccessGrant::seal_secret(&channel, &base(), &alice.public()).unwrap();

        let recovered = AccessGrant::from_hex(&format!("0x{}", grant.to_hex())).unwrap();
        assert_eq!(grant, recovered);
        assert_eq!(recovered.redeem(&channel, &alice).unwrap(), base());

        assert!(AccessGrant::from_hex("00ff").is_err());
    }

    #[test]
    fn test_grant_envelope_roundtrip() {
        let alice = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let grant = AccessGrant::seal_secret(&channel, &base(), &alice.public()).unwrap();

        let envelope = grant.to_envelope().unwrap();
        let recovered = AccessGrant::from_envelope(&envelope).unwrap();
        assert_eq!(grant, recovered);
    }

    #[test]
    fn test_grant_serde_json_roundtrip() {
        let alice = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let grant = AccessGrant::seal_secret(&channel, &base(), &alice.public()).unwrap();

        let json = serde_json::to_string(&grant).unwrap();
        let recovered: AccessGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(grant, recovered);
        assert_eq!(recovered.redeem(&channel, &alice).unwrap(), base());
    }

    #[test]
    fn test_grant_serde_bincode_roundtrip() {
        let alice = SecretKey::generate().unwrap();
        let channel = HybridChannel::default();
        let grant = AccessGrant::seal_secret(&channel, &base(), &alice.public()).unwrap();

        let binary = bincode::serialize(&grant).unwrap();
        let recovered: AccessGrant = bincode::deserialize(&binary).unwrap();
        assert_eq!(grant, recovered);
    }

    #[test]
    fn test_grant_deserialize_too_short() {
        let short_data = vec![0u8; MIN_HYBRID_CIPHERTEXT_SIZE - 1];
        let result: Result<AccessGrant, _> =
            bincode::deserialize(&bincode::serialize(&short_data).unwrap());
        assert!(result.is_err());
    }
}
