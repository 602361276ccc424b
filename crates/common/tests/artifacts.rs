//! Integration tests for sealing artifacts under turn secrets

mod common;

use ::common::crypto::{derive_secret, open, seal, Secret, VaultError};

#[test]
fn test_seal_and_open_cid() {
    let secret = derive_secret(&Secret::from(*common::BASE_SECRET), 0, 1).unwrap();

    let sealed = seal(secret.bytes(), b"testCID2").unwrap();
    assert_eq!(open(secret.bytes(), &sealed).unwrap(), b"testCID2".to_vec());

    let other = [0x11u8; 32];
    assert!(matches!(
        open(&other, &sealed),
        Err(VaultError::DecryptionFailed)
    ));
}

#[test]
fn test_large_artifact() {
    let secret = Secret::generate().unwrap();
    let weights: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();

    let sealed = secret.seal(&weights).unwrap();
    assert_eq!(secret.open(&sealed).unwrap(), weights);
}

#[test]
fn test_concurrent_sealing() {
    let secret = Secret::from(*common::BASE_SECRET);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let secret = secret.clone();
            std::thread::spawn(move || {
                let data = format!("artifact {}", i).into_bytes();
                let sealed = secret.seal(&data).unwrap();
                (data, sealed)
            })
        })
        .collect();

    for handle in handles {
        let (data, sealed) = handle.join().unwrap();
        assert_eq!(secret.open(&sealed).unwrap(), data);
    }
}
