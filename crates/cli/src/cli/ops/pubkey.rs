use clap::Args;

use common::crypto::{derive_public_key, KeyError, PublicKey};
use keyturn_cli::state::StateError;

/// Print the X25519 public key to register with the registry
#[derive(Args, Debug, Clone)]
pub struct Pubkey {
    /// Derive from this private key (hex) instead of the member key
    #[arg(long)]
    pub hex: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PubkeyError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Pubkey {
    type Error = PubkeyError;
    type Output = PublicKey;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        match &self.hex {
            Some(hex) => Ok(PublicKey::from(derive_public_key(hex)?)),
            None => Ok(ctx.state()?.load_key()?.public()),
        }
    }
}
