/**
 * Cryptographic types and operations.
 *  - Member keypairs and hex/PEM codecs
 *  - Ephemeral-key hybrid channel and access grants
 *  - Artifact encryption under the group secret
 *  - Per-turn secret derivation
 */
pub mod crypto;

pub mod prelude {
    pub use crate::crypto::{
        AccessGrant, DerivationKind, HybridChannel, PublicKey, Secret, SecretKey, TransformKind,
        TurnDerivation,
    };
}
