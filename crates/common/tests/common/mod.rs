//! Shared test utilities for group onboarding tests
#![allow(dead_code)]

use ::common::crypto::{AccessGrant, HybridChannel, Secret, SecretKey};

/// Dummy base secret used by the registry fixtures
pub const BASE_SECRET: &[u8; 32] = b"Initial secret must be 32 bytes.";

/// A group member as the registry sees it: a keypair plus the grant it redeemed
pub struct Member {
    pub key: SecretKey,
    pub grant: AccessGrant,
}

/// Set up a project owner holding a self-addressed grant of the base secret,
/// the way a project is seeded at creation.
pub fn setup_project() -> (Member, HybridChannel) {
    let channel = HybridChannel::default();
    let key = SecretKey::generate().unwrap();
    let base = Secret::from(*BASE_SECRET);
    let grant = AccessGrant::seal_secret(&channel, &base, &key.public()).unwrap();
    (Member { key, grant }, channel)
}

/// Generate a newcomer keypair from a wallet-style "0x" hex private key.
pub fn newcomer() -> (SecretKey, String) {
    let key = SecretKey::generate().unwrap();
    let hex = format!("0x{}", key.to_hex());
    (key, hex)
}
