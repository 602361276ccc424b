use clap::Args;

use common::crypto::{DerivationKind, TurnDerivation};

use super::source::{BaseSecret, SourceError};

/// Compute the secret in effect at a turn from the base secret
#[derive(Args, Debug, Clone)]
pub struct Derive {
    #[command(flatten)]
    pub base: BaseSecret,

    /// Key turn to derive the secret for
    #[arg(long)]
    pub turn: u64,

    /// Member index to scope the derivation to (defaults to config)
    #[arg(long)]
    pub member_index: Option<u64>,

    /// Turn secret derivation (defaults to config)
    #[arg(long)]
    pub derivation: Option<DerivationKind>,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Derive {
    type Error = SourceError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config();
        let base = self.base.resolve(ctx, &ctx.channel(None))?;
        let derivation = self.derivation.unwrap_or(config.derivation);
        let member_index = self.member_index.unwrap_or(config.member_index);

        Ok(derivation
            .derive_secret(&base, member_index, self.turn)?
            .to_hex())
    }
}
