pub mod aead;
pub mod error;
pub mod vault;
pub mod vault_key;

pub use error::{VaultError, VaultResult};
pub use vault::{PasswordPolicy, PasswordValidation, SeedVault};
pub use vault_key::KdfParams;
