use std::fmt;

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

/// Size of an X25519 private scalar in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of an X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("random source unavailable: {0}")]
    Random(String),
}

/// Decode a 32 byte key from hex, tolerating a leading "0x".
fn decode_key_hex(hex: &str, what: &str) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut buff = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(hex, &mut buff[..])
        .map_err(|e| KeyError::InvalidKeyFormat(format!("{} hex decode error: {}", what, e)))?;
    Ok(buff)
}

/// Derive the public key registered with the group registry from a hex private key.
///
/// Accepts both plain hex and "0x"-prefixed hex strings. The input must decode to
/// exactly [`PRIVATE_KEY_SIZE`] bytes.
pub fn derive_public_key(private_key_hex: &str) -> Result<[u8; PUBLIC_KEY_SIZE], KeyError> {
    Ok(SecretKey::from_hex(private_key_hex)?.public().to_bytes())
}

/// Public half of a member's X25519 keypair
///
/// This is the key a member registers with the registry when requesting to join,
/// and the key other members encrypt access grants to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }
}

impl From<PublicKey> for [u8; PUBLIC_KEY_SIZE] {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(KeyError::InvalidKeyFormat(format!(
                "invalid public key size, expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(buff.into())
    }
}

impl PublicKey {
    /// Parse a public key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        Ok(Self(*decode_key_hex(hex, "public key")?))
    }

    /// Convert public key to raw bytes
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    /// Borrow the raw key bytes
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Convert public key to hexadecimal string (no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Private half of a member's X25519 keypair
///
/// The scalar never leaves the owning process. It is used as-is (clamped by the
/// curve arithmetic), so a key exported from a wallet as hex maps to the same
/// public key the wallet reports.
///
/// # Examples
///
/// ```ignore
/// let secret_key = SecretKey::generate()?;
/// let public_key = secret_key.public();
///
/// // Persist to PEM format
/// let pem = secret_key.to_pem();
/// let recovered = SecretKey::from_pem(&pem)?;
/// assert_eq!(recovered.public(), public_key);
/// ```
#[derive(Clone)]
pub struct SecretKey(StaticSecret);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"..").finish()
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(StaticSecret::from(secret))
    }
}

impl SecretKey {
    /// Parse a secret key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let buff = decode_key_hex(hex, "private key")?;
        Ok(Self::from(*buff))
    }

    /// Generate a new random secret key using the OS CSPRNG
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        getrandom::getrandom(&mut bytes[..]).map_err(|e| KeyError::Random(e.to_string()))?;
        Ok(Self::from(*bytes))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        PublicKey(X25519PublicKey::from(&self.0).to_bytes())
    }

    /// Whether an exchange with `peer` depends on this key at all
    ///
    /// Small-order points (zero, one, p - 1, ...) give the all-zero shared secret
    /// whatever the private key, so anyone could compute it.
    pub(crate) fn is_contributory_with(&self, peer: &PublicKey) -> bool {
        self.0
            .diffie_hellman(&X25519PublicKey::from(peer.0))
            .was_contributory()
    }

    /// Convert secret key to raw bytes
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Convert secret key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Encode secret key in PEM format for local storage
    ///
    /// Returns a PEM-encoded string with tag "PRIVATE KEY".
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new("PRIVATE KEY", self.to_bytes());
        pem::encode(&pem)
    }

    /// Parse a secret key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The key size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str)
            .map_err(|e| KeyError::InvalidKeyFormat(format!("failed to parse PEM: {}", e)))?;

        if pem.tag() != "PRIVATE KEY" {
            return Err(KeyError::InvalidKeyFormat(
                "invalid PEM tag, expected PRIVATE KEY".to_string(),
            ));
        }

        let contents = pem.contents();
        if contents.len() != PRIVATE_KEY_SIZE {
            return Err(KeyError::InvalidKeyFormat(format!(
                "invalid private key size in PEM, expected {}, got {}",
                PRIVATE_KEY_SIZE,
                contents.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        bytes.copy_from_slice(contents);
        Ok(Self::from(*bytes))
    }

    /// Hand the scalar to the NaCl box implementation.
    pub(crate) fn to_box_secret(&self) -> crypto_box::SecretKey {
        crypto_box::SecretKey::from(self.0.to_bytes())
    }
}
