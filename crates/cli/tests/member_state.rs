use common::crypto::{AccessGrant, DerivationKind, HybridChannel, Secret, TransformKind};
use keyturn_cli::{AppConfig, AppState};
use tempfile::TempDir;

fn member(dir: &TempDir, config: AppConfig) -> AppState {
    AppState::init(Some(dir.path().join("keyturn")), Some(config), None).unwrap()
}

#[test]
fn test_members_with_shared_config_agree_on_turn_secret() {
    let config = AppConfig {
        derivation: DerivationKind::Blake3,
        transform: TransformKind::Raw,
        ..Default::default()
    };
    let owner_dir = TempDir::new().unwrap();
    let newcomer_dir = TempDir::new().unwrap();
    let owner = member(&owner_dir, config.clone());
    let newcomer = member(&newcomer_dir, config);

    let base = Secret::generate().unwrap();
    let newcomer_key = newcomer.load_key().unwrap();

    // the owner only sees the newcomer's public key and the registry turn
    let owner_config = AppState::load(Some(owner_dir.path().join("keyturn")))
        .unwrap()
        .config;
    let channel = HybridChannel::new(owner_config.transform);
    let (grant, turn) = AccessGrant::onboard(
        &channel,
        &owner_config.derivation,
        &base,
        owner_config.member_index,
        2,
        &newcomer_key.public(),
    )
    .unwrap();
    assert_eq!(turn, 3);

    let redeemed = grant
        .redeem(&HybridChannel::new(newcomer.config.transform), &newcomer_key)
        .unwrap();
    assert_eq!(
        redeemed,
        common::crypto::TurnDerivation::derive_secret(&DerivationKind::Blake3, &base, 0, 3)
            .unwrap()
    );

    // owner's key cannot open a grant addressed to the newcomer
    assert!(grant
        .redeem(&channel, &owner.load_key().unwrap())
        .is_err());
}

#[test]
fn test_key_survives_reload() {
    let dir = TempDir::new().unwrap();
    let state = member(&dir, AppConfig::default());
    let public = state.load_key().unwrap().public();

    let reloaded = AppState::load(Some(dir.path().join("keyturn"))).unwrap();
    assert_eq!(reloaded.load_key().unwrap().public(), public);
    assert_eq!(reloaded.config.transform, TransformKind::Ascii85);
}

#[cfg(unix)]
#[test]
fn test_key_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let state = member(&dir, AppConfig::default());
    let mode = std::fs::metadata(&state.key_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
