use async_trait::async_trait;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Why a password check did not yield the secret.
///
/// The reveal gate treats every variant the same way; the distinction only
/// matters to whoever renders the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect password")]
    InvalidPassword,

    #[error("Password verifier unavailable: {0}")]
    VerifierUnavailable(String),
}

/// Secret recovery phrase bytes, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretPhrase {
    bytes: Vec<u8>,
}

impl SecretPhrase {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// UTF-8 view of the phrase, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Owned copy of the phrase text that is zeroized when dropped.
    pub fn to_text(&self) -> Zeroizing<String> {
        Zeroizing::new(String::from_utf8_lossy(&self.bytes).into_owned())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<&str> for SecretPhrase {
    fn from(phrase: &str) -> Self {
        Self::new(phrase.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for SecretPhrase {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl std::fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretPhrase")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Checks a password and, on success, hands back the secret it protects.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, password: &str) -> Result<SecretPhrase, AuthError>;
}
