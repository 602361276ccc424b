pub mod derive;
pub mod grant;
pub mod init;
pub mod open;
pub mod pubkey;
pub mod redeem;
pub mod seal;
pub mod source;
pub mod version;

pub use derive::Derive;
pub use grant::Grant;
pub use init::Init;
pub use open::Open;
pub use pubkey::Pubkey;
pub use redeem::Redeem;
pub use seal::Seal;
pub use version::Version;
