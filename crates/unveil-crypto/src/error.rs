use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    #[error("AEAD decryption failed: wrong password or tampered vault")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Password rejected by policy: {0}")]
    WeakPassword(String),

    #[error("Recovery phrase cannot be empty")]
    EmptyPhrase,

    #[error("Unsupported vault version: {0}")]
    UnsupportedVersion(u32),

    #[error("Vault I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
