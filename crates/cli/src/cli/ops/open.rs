use std::path::PathBuf;

use clap::Args;

use common::crypto::VaultError;

use super::source::{SourceError, TurnSecret};

/// Decrypt an artifact sealed under a turn secret
#[derive(Args, Debug, Clone)]
pub struct Open {
    #[command(flatten)]
    pub secret: TurnSecret,

    /// Sealed artifact
    #[arg(long)]
    pub input: PathBuf,

    /// Where to write the plaintext
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("open failed: {0}")]
    Vault(#[from] VaultError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = self.secret.resolve(ctx)?;
        let sealed = tokio::fs::read(&self.input).await?;
        let data = secret.open(&sealed)?;
        tokio::fs::write(&self.output, &data).await?;

        Ok(format!("Opened {} bytes to {}", data.len(), self.output.display()))
    }
}
