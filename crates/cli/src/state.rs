use std::{fs, path::PathBuf};

use common::prelude::{DerivationKind, SecretKey, TransformKind};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "keyturn";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level, overridable with RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (optional, logs to stderr only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// KDF used to derive turn secrets; every member of a project must agree
    #[serde(default)]
    pub derivation: DerivationKind,
    /// Encoding applied to secrets before boxing them for a recipient
    #[serde(default)]
    pub transform: TransformKind,
    /// Recipient scope passed to turn derivation (0 for global rotation)
    #[serde(default)]
    pub member_index: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            derivation: DerivationKind::default(),
            transform: TransformKind::default(),
            member_index: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the keyturn directory (~/.keyturn)
    pub keyturn_dir: PathBuf,
    /// Path to the member key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the keyturn directory path (custom or default ~/.keyturn)
    pub fn keyturn_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new keyturn state directory
    ///
    /// A fresh member key is generated unless `key` is given, e.g. when importing
    /// a wallet key.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
        key: Option<SecretKey>,
    ) -> Result<Self, StateError> {
        let keyturn_dir = Self::keyturn_dir(custom_path)?;

        if keyturn_dir.join(KEY_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&keyturn_dir)?;

        let key = match key {
            Some(key) => key,
            None => SecretKey::generate().map_err(|e| StateError::InvalidKey(e.to_string()))?,
        };
        let key_path = keyturn_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;
        restrict_permissions(&key_path)?;

        let config = config.unwrap_or_default();
        let config_path = keyturn_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        tracing::info!(dir = %keyturn_dir.display(), "initialized keyturn directory");

        Ok(Self {
            keyturn_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the keyturn directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let keyturn_dir = Self::keyturn_dir(custom_path)?;

        if !keyturn_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = keyturn_dir.join(KEY_FILE_NAME);
        let config_path = keyturn_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            keyturn_dir,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the member's secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> Result<(), StateError> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("keyturn directory not initialized. Run 'keyturn init' first")]
    NotInitialized,

    #[error("keyturn directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
