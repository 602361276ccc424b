//! Artifact encryption under the group secret
//!
//! Model weights and other artifacts are sealed with AES-256-GCM under the
//! secret active for the current turn before they are pushed to content-addressed
//! storage. Anyone holding that turn's secret can open them again; there is no
//! public-key step on this layer.
//!
//! The wire layout follows the ECIES AES helpers the registry tooling was built
//! around, a 16 byte GCM nonce followed by the tag and the ciphertext:
//!
//! ```text
//! [ nonce: 16 ][ tag: 16 ][ ciphertext ]
//! ```

use std::fmt;
use std::io::Read;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256-GCM with the 128-bit nonce used by the ECIES helpers
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 16;
/// Size of the GCM tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of a group secret in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Errors that can occur during artifact encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    /// Tag mismatch, truncated input or wrong secret. Deliberately carries no detail.
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("random source unavailable: {0}")]
    Random(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A 256-bit symmetric group secret
///
/// Used both as the project's base secret and as the per-turn secret derived from
/// it. The bytes are wiped when the value is dropped.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate()?;
///
/// let sealed = secret.seal(b"model weights")?;
/// let opened = secret.open(&sealed)?;
/// assert_eq!(opened, b"model weights");
/// ```
#[derive(PartialEq, Eq, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&"..").finish()
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using the OS CSPRNG
    pub fn generate() -> Result<Self, VaultError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).map_err(|e| VaultError::Random(e.to_string()))?;
        Ok(Self(buff))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, VaultError> {
        if data.len() != SECRET_SIZE {
            return Err(VaultError::InvalidKeyFormat(format!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )));
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse a secret from hex, with or without a "0x" prefix
    pub fn from_hex(hex: &str) -> Result<Self, VaultError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; SECRET_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|e| VaultError::InvalidKeyFormat(format!("secret hex decode error: {}", e)))?;
        Ok(buff.into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get a reference to the secret bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Aes256Gcm16 {
        Aes256Gcm16::new(GenericArray::from_slice(&self.0))
    }

    /// Seal artifact bytes under this secret
    ///
    /// The output format is `nonce (16) || tag (16) || ciphertext`. A fresh random
    /// nonce is drawn for each call.
    ///
    /// # Errors
    ///
    /// Returns an error only if the system RNG fails or the plaintext exceeds the
    /// GCM length limit.
    pub fn seal(&self, data: &[u8]) -> Result<Vec<u8>, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| VaultError::Random(format!("failed to generate nonce: {}", e)))?;

        let mut buffer = data.to_vec();
        let tag = self
            .cipher()
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce_bytes), b"", &mut buffer)
            .map_err(|_| VaultError::EncryptionFailed("encrypt error".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + buffer.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(tag.as_slice());
        out.extend_from_slice(&buffer);

        tracing::trace!(len = data.len(), "sealed artifact");

        Ok(out)
    }

    /// Open bytes produced by [`Secret::seal`]
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::DecryptionFailed`] if the data is shorter than the
    /// nonce and tag, or if authentication fails (tampering or wrong secret).
    pub fn open(&self, data: &[u8]) -> Result<Vec<u8>, VaultError> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::DecryptionFailed);
        }

        let (nonce_bytes, rest) = data.split_at(NONCE_SIZE);
        let (tag_bytes, ciphertext) = rest.split_at(TAG_SIZE);

        let mut buffer = ciphertext.to_vec();
        if self
            .cipher()
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce_bytes),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag_bytes),
            )
            .is_err()
        {
            buffer.zeroize();
            return Err(VaultError::DecryptionFailed);
        }

        tracing::trace!(len = buffer.len(), "opened artifact");

        Ok(buffer)
    }

    /// Seal everything read from `reader`
    ///
    /// The whole artifact is buffered in memory before sealing.
    pub fn seal_reader<R>(&self, mut reader: R) -> Result<impl Read, VaultError>
    where
        R: Read,
    {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;

        let sealed = self.seal(&data)?;
        Ok(std::io::Cursor::new(sealed))
    }

    /// Open everything read from `reader`
    pub fn open_reader<R>(&self, mut reader: R) -> Result<impl Read, VaultError>
    where
        R: Read,
    {
        let mut sealed = Vec::new();
        reader.read_to_end(&mut sealed)?;

        let opened = self.open(&sealed)?;
        Ok(std::io::Cursor::new(opened))
    }
}

/// Seal `plaintext` under a raw 32-byte secret
pub fn seal(secret: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    Secret::from_slice(secret)?.seal(plaintext)
}

/// Open a sealed artifact under a raw 32-byte secret
pub fn open(secret: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
    Secret::from_slice(secret)?.open(ciphertext)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_seal_open_cid() {
        let secret = Secret::from_slice(b"Initial secret must be 32 bytes.").unwrap();

        let sealed = secret.seal(b"testCID2").unwrap();
        assert_eq!(secret.open(&sealed).unwrap(), b"testCID2".to_vec());

        let other = Secret::from_slice(&[7u8; SECRET_SIZE]).unwrap();
        assert!(matches!(other.open(&sealed), Err(VaultError::DecryptionFailed)));
    }

    #[test]
    fn test_raw_secret_functions() {
        let secret = [42u8; SECRET_SIZE];
        let sealed = seal(&secret, b"weights").unwrap();
        assert_eq!(open(&secret, &sealed).unwrap(), b"weights".to_vec());

        assert!(matches!(
            seal(&[1u8; 16], b"weights"),
            Err(VaultError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_ciphertext_layout() {
        let secret = Secret::generate().unwrap();
        let data = b"hello world";

        let sealed = secret.seal(data).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + TAG_SIZE + data.len());

        // fresh nonce per call
        let again = secret.seal(data).unwrap();
        assert_ne!(sealed[..NONCE_SIZE], again[..NONCE_SIZE]);
    }

    #[test]
    fn test_bit_flips_are_rejected() {
        let secret = Secret::generate().unwrap();
        let sealed = secret.seal(b"weights").unwrap();

        for i in 0..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[i] ^= 1 << bit;
                assert!(matches!(
                    secret.open(&tampered),
                    Err(VaultError::DecryptionFailed)
                ));
            }
        }
    }

    #[test]
    fn test_truncated_input_fails() {
        let secret = Secret::generate().unwrap();
        let sealed = secret.seal(b"weights").unwrap();

        for len in [0, NONCE_SIZE, NONCE_SIZE + TAG_SIZE - 1, sealed.len() - 1] {
            assert!(matches!(
                secret.open(&sealed[..len]),
                Err(VaultError::DecryptionFailed)
            ));
        }
    }

    #[test]
    fn test_seal_open_reader() {
        let secret = Secret::generate().unwrap();
        let data = b"hello world, this is a test message for reader encryption and decryption";

        let mut sealed_reader = secret.seal_reader(Cursor::new(data.to_vec())).unwrap();
        let mut sealed = Vec::new();
        sealed_reader.read_to_end(&mut sealed).unwrap();

        let mut opened_reader = secret.open_reader(Cursor::new(sealed)).unwrap();
        let mut opened = Vec::new();
        opened_reader.read_to_end(&mut opened).unwrap();

        assert_eq!(data.to_vec(), opened);
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(Secret::from_slice(&[1u8; 16]).is_err());
        assert!(Secret::from_slice(&[1u8; 64]).is_err());
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = Secret::generate().unwrap();
        let recovered = Secret::from_hex(&format!("0x{}", secret.to_hex())).unwrap();
        assert_eq!(secret, recovered);
    }

    #[test]
    fn test_rng_failure_is_not_an_encryption_failure() {
        let err = VaultError::Random("getrandom: unavailable".to_string());
        assert!(err.to_string().starts_with("random source unavailable"));
        assert!(!matches!(err, VaultError::EncryptionFailed(_)));
    }

    #[test]
    fn test_empty_data() {
        let secret = Secret::generate().unwrap();
        let sealed = secret.seal(b"").unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + TAG_SIZE);
        assert!(secret.open(&sealed).unwrap().is_empty());
    }
}
