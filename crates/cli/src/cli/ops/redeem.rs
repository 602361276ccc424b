use clap::Args;

use common::crypto::{GrantError, TransformKind};
use keyturn_cli::state::StateError;

use super::source::{parse_grant, SourceError};

/// Recover the secret granted to the member key
#[derive(Args, Debug, Clone)]
pub struct Redeem {
    /// Grant addressed to the member key (hex or wallet JSON)
    #[arg(long)]
    pub grant: String,

    /// Payload encoding the grant was issued with (defaults to config)
    #[arg(long)]
    pub transform: Option<TransformKind>,
}

#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("redeem failed: {0}")]
    Grant(#[from] GrantError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Redeem {
    type Error = RedeemError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = ctx.state()?.load_key()?;
        let grant = parse_grant(&self.grant)?;
        let secret = grant.redeem(&ctx.channel(self.transform), &key)?;
        Ok(secret.to_hex())
    }
}
