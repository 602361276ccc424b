use std::path::PathBuf;

use clap::Args;

use common::crypto::VaultError;

use super::source::{SourceError, TurnSecret};

/// Encrypt an artifact under a turn secret
#[derive(Args, Debug, Clone)]
pub struct Seal {
    #[command(flatten)]
    pub secret: TurnSecret,

    /// File to encrypt
    #[arg(long)]
    pub input: PathBuf,

    /// Where to write the sealed artifact
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("seal failed: {0}")]
    Vault(#[from] VaultError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Seal {
    type Error = SealError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = self.secret.resolve(ctx)?;
        let data = tokio::fs::read(&self.input).await?;
        let sealed = secret.seal(&data)?;
        tokio::fs::write(&self.output, &sealed).await?;

        tracing::info!(input = %self.input.display(), len = data.len(), "sealed artifact");

        Ok(format!(
            "Sealed {} bytes to {}",
            sealed.len(),
            self.output.display()
        ))
    }
}
