use clap::{ArgGroup, Args};

use common::crypto::{AccessGrant, DerivationKind, GrantError, KeyError, PublicKey, TransformKind};

use super::source::{BaseSecret, SourceError};

/// Issue an access grant to a member's registered public key
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["turn", "current_turn", "raw_base"])
))]
pub struct Grant {
    /// Recipient's registered X25519 public key (hex)
    #[arg(long)]
    pub recipient: String,

    #[command(flatten)]
    pub base: BaseSecret,

    /// Grant the secret in effect at this turn
    #[arg(long)]
    pub turn: Option<u64>,

    /// Onboard the recipient at the turn after the registry's current one
    #[arg(long)]
    pub current_turn: Option<u64>,

    /// Grant the base secret itself, e.g. to seed a new project
    #[arg(long)]
    pub raw_base: bool,

    /// Member index to scope the derivation to (defaults to config)
    #[arg(long)]
    pub member_index: Option<u64>,

    /// Turn secret derivation (defaults to config)
    #[arg(long)]
    pub derivation: Option<DerivationKind>,

    /// Payload encoding (defaults to config)
    #[arg(long)]
    pub transform: Option<TransformKind>,

    /// Print the wallet JSON envelope instead of hex
    #[arg(long)]
    pub envelope: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GrantOpError {
    #[error("invalid recipient: {0}")]
    Recipient(#[from] KeyError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("grant failed: {0}")]
    Grant(#[from] GrantError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Grant {
    type Error = GrantOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = ctx.config();
        let recipient = PublicKey::from_hex(&self.recipient)?;
        let channel = ctx.channel(self.transform);
        let base = self.base.resolve(ctx, &ctx.channel(None))?;

        let derivation = self.derivation.unwrap_or(config.derivation);
        let member_index = self.member_index.unwrap_or(config.member_index);

        let grant = match (self.turn, self.current_turn) {
            (Some(turn), _) => {
                AccessGrant::issue(&channel, &derivation, &base, member_index, turn, &recipient)?
            }
            (None, Some(current_turn)) => {
                let (grant, next_turn) = AccessGrant::onboard(
                    &channel,
                    &derivation,
                    &base,
                    member_index,
                    current_turn,
                    &recipient,
                )?;
                tracing::info!(next_turn, "registry must advance its key turn");
                grant
            }
            (None, None) => AccessGrant::seal_secret(&channel, &base, &recipient)?,
        };

        if self.envelope {
            Ok(grant.to_envelope()?.to_json().map_err(GrantError::from)?)
        } else {
            Ok(format!("0x{}", grant.to_hex()))
        }
    }
}
