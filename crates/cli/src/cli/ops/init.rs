use std::path::PathBuf;

use clap::Args;

use common::crypto::{DerivationKind, KeyError, SecretKey, TransformKind};
use keyturn_cli::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Import an existing X25519 private key (hex) instead of generating one
    #[arg(long)]
    pub import_key: Option<String>,

    /// Turn secret derivation shared by the project
    #[arg(long, default_value_t = DerivationKind::default())]
    pub derivation: DerivationKind,

    /// Payload encoding used for grants
    #[arg(long, default_value_t = TransformKind::default())]
    pub transform: TransformKind,

    /// Member index used to scope turn secrets (0 for global rotation)
    #[arg(long, default_value_t = 0)]
    pub member_index: u64,

    /// Default log level
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory for log files (optional)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            derivation: self.derivation,
            transform: self.transform,
            member_index: self.member_index,
        };

        let key = self
            .import_key
            .as_deref()
            .map(SecretKey::from_hex)
            .transpose()?;

        let state = AppState::init(ctx.config_path.clone(), Some(config), key)?;
        let public = state.load_key()?.public();

        let output = format!(
            "Initialized keyturn directory at: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - Derivation: {}\n\
             - Transform: {}\n\
             - Member index: {}\n\
             - Public key: {}",
            state.keyturn_dir.display(),
            state.key_path.display(),
            state.config_path.display(),
            state.config.derivation,
            state.config.transform,
            state.config.member_index,
            public
        );

        Ok(output)
    }
}
