//! Cryptographic primitives for keyturn groups
//!
//! This module provides everything a member needs to take part in a group whose
//! membership is tracked by an external registry:
//!
//! - **Identity**: X25519 keypairs (`SecretKey`/`PublicKey`); the public half is
//!   what a member registers
//! - **Key Sharing**: ephemeral-key NaCl boxes (`HybridChannel`) to hand a group
//!   secret to exactly one member
//! - **Artifact Encryption**: AES-256-GCM under the group `Secret`
//! - **Rotation**: per-turn secrets derived from the base secret (`TurnDerivation`)
//!
//! # Security Model
//!
//! ## Base secret
//! Each project has one random 32 byte base secret, created with the project and
//! never written to the registry in plaintext. Members receive it, or a turn
//! secret derived from it, only as an `AccessGrant` addressed to their key.
//!
//! ## Turns
//! The registry owns a monotonically increasing key turn. The secret in effect
//! at turn `t` is `derive(base, member_index, t)`, so rotating means bumping the
//! counter, not redistributing bytes.
//!
//! ## Granting access
//! 1. Generate an ephemeral X25519 keypair
//! 2. Perform ECDH with the recipient's registered public key
//! 3. Ascii85-encode the secret and seal it with XSalsa20-Poly1305
//! 4. Package as `ephemeral_pubkey || nonce || box`
//!
//! All operations here are pure functions of their inputs plus the OS random
//! source; nothing is cached between calls.

mod channel;
mod envelope;
mod grant;
mod keys;
mod secret;
mod transform;
mod turn;

pub use channel::{
    decrypt_from, encrypt_to, ChannelError, HybridChannel, BOX_NONCE_SIZE, BOX_TAG_SIZE,
    MIN_HYBRID_CIPHERTEXT_SIZE,
};
pub use envelope::{EncryptedEnvelope, EnvelopeError, ENVELOPE_VERSION};
pub use grant::{AccessGrant, GrantError};
pub use keys::{derive_public_key, KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use secret::{open, seal, Secret, VaultError, SECRET_SIZE};
pub use transform::{Ascii85, PayloadTransform, Raw, TransformError, TransformKind};
pub use turn::{
    derive_secret, Blake3Keyed, DerivationKind, HkdfSha256, TurnDerivation, TurnError,
    BLAKE3_TURN_CONTEXT, HKDF_TURN_SALT,
};
