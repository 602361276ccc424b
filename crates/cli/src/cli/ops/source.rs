//! Where an op gets its secret material from

use clap::Args;

use common::crypto::{
    AccessGrant, DerivationKind, EncryptedEnvelope, EnvelopeError, GrantError, HybridChannel,
    Secret, TransformKind, TurnDerivation, TurnError, VaultError,
};
use keyturn_cli::state::StateError;

use crate::cli::op::OpContext;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("one of --base or --base-grant is required")]
    MissingBase,
    #[error("--turn is required unless --secret is given")]
    MissingTurn,
    #[error(transparent)]
    State(#[from] StateError),
    #[error("invalid secret: {0}")]
    Secret(#[from] VaultError),
    #[error("grant error: {0}")]
    Grant(#[from] GrantError),
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    #[error("turn derivation failed: {0}")]
    Turn(#[from] TurnError),
}

/// The project's base secret, either in the clear or as a grant to the member key
#[derive(Args, Debug, Clone)]
pub struct BaseSecret {
    /// Project base secret (hex)
    #[arg(long, conflicts_with = "base_grant")]
    pub base: Option<String>,

    /// Grant of the base secret addressed to the member key (hex or wallet JSON)
    #[arg(long)]
    pub base_grant: Option<String>,
}

impl BaseSecret {
    pub fn resolve(
        &self,
        ctx: &OpContext,
        channel: &HybridChannel<TransformKind>,
    ) -> Result<Secret, SourceError> {
        match (&self.base, &self.base_grant) {
            (Some(hex), _) => Ok(Secret::from_hex(hex)?),
            (None, Some(grant)) => {
                let key = ctx.state()?.load_key()?;
                Ok(parse_grant(grant)?.redeem(channel, &key)?)
            }
            (None, None) => Err(SourceError::MissingBase),
        }
    }
}

/// The secret in effect at a turn, given directly or derived from the base secret
#[derive(Args, Debug, Clone)]
pub struct TurnSecret {
    /// Turn secret to use as-is (hex)
    #[arg(long, conflicts_with_all = ["base", "base_grant", "turn"])]
    pub secret: Option<String>,

    #[command(flatten)]
    pub base: BaseSecret,

    /// Key turn whose secret to derive
    #[arg(long)]
    pub turn: Option<u64>,

    /// Member index to scope the derivation to (defaults to config)
    #[arg(long)]
    pub member_index: Option<u64>,

    /// Turn secret derivation (defaults to config)
    #[arg(long)]
    pub derivation: Option<DerivationKind>,
}

impl TurnSecret {
    pub fn resolve(&self, ctx: &OpContext) -> Result<Secret, SourceError> {
        if let Some(hex) = &self.secret {
            return Ok(Secret::from_hex(hex)?);
        }
        let turn = self.turn.ok_or(SourceError::MissingTurn)?;

        let config = ctx.config();
        let base = self.base.resolve(ctx, &ctx.channel(None))?;
        let derivation = self.derivation.unwrap_or(config.derivation);
        let member_index = self.member_index.unwrap_or(config.member_index);

        Ok(derivation.derive_secret(&base, member_index, turn)?)
    }
}

/// Parse a grant given as hex or as a wallet JSON envelope
pub fn parse_grant(input: &str) -> Result<AccessGrant, SourceError> {
    let input = input.trim();
    if input.starts_with('{') {
        let envelope = EncryptedEnvelope::from_json(input)?;
        Ok(AccessGrant::from_envelope(&envelope)?)
    } else {
        Ok(AccessGrant::from_hex(input)?)
    }
}
