//! Hybrid public-key encryption of short payloads between members
//!
//! This is the NaCl `box` construction (X25519 + XSalsa20-Poly1305) with a fresh
//! ephemeral sender key per message, laid out the way browser wallets expect for
//! `eth_decrypt`:
//!
//! ```text
//! [ ephemeral_pubkey: 32 ][ nonce: 24 ][ poly1305 tag: 16 ][ ciphertext ]
//! ```
//!
//! The sender half of the box is thrown away right after sealing, so only the
//! recipient's long-term key can ever open the result. Payloads pass through a
//! [`PayloadTransform`] before sealing (Ascii85 by default) so the opened box is
//! valid UTF-8 for wallets.

use crypto_box::aead::{Aead, Nonce};
use crypto_box::SalsaBox;
use zeroize::Zeroizing;

use super::keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
use super::transform::{Ascii85, PayloadTransform};

/// Size of the XSalsa20 nonce in bytes
pub const BOX_NONCE_SIZE: usize = 24;
/// Size of the Poly1305 tag in bytes
pub const BOX_TAG_SIZE: usize = 16;
/// Smallest blob `decrypt_from` will attempt to open
pub const MIN_HYBRID_CIPHERTEXT_SIZE: usize = PUBLIC_KEY_SIZE + BOX_NONCE_SIZE + BOX_TAG_SIZE;

/// Errors that can occur on the hybrid channel
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    /// Authentication failed, the input was truncated, or the wrong key was used.
    /// Deliberately carries no detail.
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// Ephemeral-key box channel, parameterised by the payload transform
///
/// # Examples
///
/// ```ignore
/// let bob = SecretKey::generate()?;
/// let channel = HybridChannel::default();
///
/// let ciphertext = channel.encrypt_to(&bob.public(), b"group secret")?;
/// let plaintext = channel.decrypt_from(&bob, &ciphertext)?;
/// assert_eq!(plaintext, b"group secret");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HybridChannel<T = Ascii85> {
    transform: T,
}

/// The wallet-compatible channel
impl Default for HybridChannel<Ascii85> {
    fn default() -> Self {
        Self { transform: Ascii85 }
    }
}

impl<T: PayloadTransform> HybridChannel<T> {
    pub fn new(transform: T) -> Self {
        Self { transform }
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Encrypt a payload so that only the holder of `recipient`'s private key can read it
    ///
    /// A new ephemeral keypair and nonce are drawn from the OS CSPRNG on every call;
    /// there is no way to supply either from outside.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::InvalidPublicKey`] for small-order keys, which would let
    /// anyone open the box, or a key error if the random source is unavailable.
    pub fn encrypt_to(
        &self,
        recipient: &PublicKey,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, ChannelError> {
        let ephemeral = SecretKey::generate()?;
        if !ephemeral.is_contributory_with(recipient) {
            return Err(ChannelError::InvalidPublicKey(
                "low-order public key".to_string(),
            ));
        }

        let encoded = Zeroizing::new(self.transform.encode(plaintext));
        let ephemeral_public = ephemeral.public();
        let salsa_box = SalsaBox::new(
            &crypto_box::PublicKey::from(recipient.to_bytes()),
            &ephemeral.to_box_secret(),
        );

        let mut nonce_bytes = [0u8; BOX_NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).map_err(|e| KeyError::Random(e.to_string()))?;
        let nonce = Nonce::<SalsaBox>::from_slice(&nonce_bytes);

        let sealed = salsa_box
            .encrypt(nonce, encoded.as_slice())
            .map_err(|_| ChannelError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(PUBLIC_KEY_SIZE + BOX_NONCE_SIZE + sealed.len());
        out.extend_from_slice(ephemeral_public.as_bytes());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);

        tracing::debug!(
            recipient = %recipient,
            payload_len = plaintext.len(),
            ciphertext_len = out.len(),
            "sealed payload to recipient"
        );

        Ok(out)
    }

    /// Open a blob produced by [`HybridChannel::encrypt_to`]
    ///
    /// # Errors
    ///
    /// Every failure (short input, bad tag, wrong key, undecodable payload) is
    /// reported as [`ChannelError::DecryptionFailed`].
    pub fn decrypt_from(
        &self,
        recipient_key: &SecretKey,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, ChannelError> {
        if ciphertext.len() < MIN_HYBRID_CIPHERTEXT_SIZE {
            tracing::debug!(len = ciphertext.len(), "hybrid ciphertext too short");
            return Err(ChannelError::DecryptionFailed);
        }

        let (ephemeral_bytes, rest) = ciphertext.split_at(PUBLIC_KEY_SIZE);
        let (nonce_bytes, sealed) = rest.split_at(BOX_NONCE_SIZE);

        // X25519 ignores the top bit, so a set bit would open under the same key
        if ephemeral_bytes[PUBLIC_KEY_SIZE - 1] & 0x80 != 0 {
            return Err(ChannelError::DecryptionFailed);
        }

        let ephemeral_public =
            PublicKey::try_from(ephemeral_bytes).map_err(|_| ChannelError::DecryptionFailed)?;
        if !recipient_key.is_contributory_with(&ephemeral_public) {
            return Err(ChannelError::DecryptionFailed);
        }
        let salsa_box = SalsaBox::new(
            &crypto_box::PublicKey::from(ephemeral_public.to_bytes()),
            &recipient_key.to_box_secret(),
        );

        let opened = Zeroizing::new(
            salsa_box
                .decrypt(Nonce::<SalsaBox>::from_slice(nonce_bytes), sealed)
                .map_err(|_| ChannelError::DecryptionFailed)?,
        );

        let plaintext = self
            .transform
            .decode(&opened)
            .map_err(|_| ChannelError::DecryptionFailed)?;

        tracing::debug!(payload_len = plaintext.len(), "opened payload");

        Ok(plaintext)
    }
}

/// Encrypt `plaintext` to a raw 32-byte recipient key using the wallet-compatible channel
pub fn encrypt_to(recipient_public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, ChannelError> {
    let recipient = PublicKey::try_from(recipient_public_key)
        .map_err(|e| ChannelError::InvalidPublicKey(e.to_string()))?;
    HybridChannel::<Ascii85>::default().encrypt_to(&recipient, plaintext)
}

/// Decrypt a hybrid blob with a raw 32-byte private key using the wallet-compatible channel
pub fn decrypt_from(recipient_private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, ChannelError> {
    let bytes: [u8; PRIVATE_KEY_SIZE] = recipient_private_key.try_into().map_err(|_| {
        KeyError::InvalidKeyFormat(format!(
            "invalid private key size, expected {}, got {}",
            PRIVATE_KEY_SIZE,
            recipient_private_key.len()
        ))
    })?;
    let recipient_key = SecretKey::from(bytes);
    HybridChannel::<Ascii85>::default().decrypt_from(&recipient_key, ciphertext)
}
