//! Seed vault: the recovery phrase sealed under a password-derived key.
//!
//! Unlocking is the password check: only the right password opens the
//! AEAD envelope, and opening it yields the phrase. That makes the vault a
//! drop-in [`AuthVerifier`] for the reveal gate.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unveil_core::auth::{AuthError, AuthVerifier, SecretPhrase};
use unveil_core::events::KeyType;
use zeroize::Zeroizing;

use crate::aead::{self, NONCE_SIZE};
use crate::error::{VaultError, VaultResult};
use crate::vault_key::{self, KdfParams, VaultKey};

const VAULT_VERSION: u32 = 2;

// ── Password policy ──────────────────────────────────────────────────

/// Requirements for a new vault password.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_letter: bool,
    pub require_digit: bool,
}

#[derive(Debug, Clone)]
pub struct PasswordValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl PasswordPolicy {
    pub fn default_policy() -> Self {
        Self {
            min_length: 8,
            max_length: 256,
            require_letter: true,
            require_digit: false,
        }
    }

    pub fn validate(&self, password: &str) -> PasswordValidation {
        let mut errors = Vec::new();
        let len = password.chars().count();
        if len < self.min_length {
            errors.push(format!("At least {} characters", self.min_length));
        }
        if len > self.max_length {
            errors.push(format!("At most {} characters", self.max_length));
        }
        if self.require_letter && !password.chars().any(|c| c.is_alphabetic()) {
            errors.push("At least one letter".into());
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("At least one digit".into());
        }
        PasswordValidation {
            valid: errors.is_empty(),
            errors,
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}

// ── SeedVault ────────────────────────────────────────────────────────

/// Persisted, password-sealed recovery phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedVault {
    pub version: u32,
    pub key_type: KeyType,
    pub created_at: DateTime<Utc>,
    pub kdf: KdfParams,
    pub salt: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

impl SeedVault {
    /// Seal `phrase` under `password` with the given Argon2id work factor.
    /// The password must pass `policy`.
    pub fn create(
        password: &str,
        phrase: &[u8],
        key_type: KeyType,
        policy: &PasswordPolicy,
        kdf: KdfParams,
    ) -> VaultResult<Self> {
        let validation = policy.validate(password);
        if !validation.valid {
            return Err(VaultError::WeakPassword(validation.errors.join(", ")));
        }
        if phrase.is_empty() {
            return Err(VaultError::EmptyPhrase);
        }

        let salt = vault_key::generate_salt();
        let key = VaultKey::from_password(password.as_bytes(), &salt, &kdf)?;
        let (ciphertext, nonce) = aead::seal(phrase, &aad(VAULT_VERSION, key_type), key.as_bytes())?;

        Ok(Self {
            version: VAULT_VERSION,
            key_type,
            created_at: Utc::now(),
            kdf,
            salt: salt.to_vec(),
            nonce,
            ciphertext,
        })
    }

    /// Open the vault. Any failure to authenticate the envelope is
    /// `DecryptionFailed`, whether from a wrong password or tampering.
    pub fn unlock(&self, password: &str) -> VaultResult<SecretPhrase> {
        if self.version != VAULT_VERSION {
            return Err(VaultError::UnsupportedVersion(self.version));
        }
        let key = VaultKey::from_password(password.as_bytes(), &self.salt, &self.kdf)?;
        let plaintext = aead::open(
            &self.ciphertext,
            &aad(self.version, self.key_type),
            &self.nonce,
            key.as_bytes(),
        )?;
        Ok(SecretPhrase::new(plaintext))
    }

    /// Save to disk as JSON.
    ///
    /// Written to a sibling temp file, synced, then renamed over `path`,
    /// so a crash never leaves a half-written vault. Owner-only on unix.
    pub fn save(&self, path: &Path) -> VaultResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json =
            serde_json::to_vec_pretty(self).map_err(|e| VaultError::Serialization(e.to_string()))?;

        let tmp = tmp_path(path);
        let written = write_private(&tmp, &json).and_then(|()| std::fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(e));
        }
        Ok(())
    }

    /// Load from disk.
    pub fn load(path: &Path) -> VaultResult<Self> {
        let bytes = std::fs::read(path).map_err(io_err)?;
        serde_json::from_slice(&bytes).map_err(|e| VaultError::Serialization(e.to_string()))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(0o600);
    let mut file = opts.open(path)?;
    // mode() only applies on creation; a stale temp file keeps its bits.
    #[cfg(unix)]
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn io_err(e: std::io::Error) -> VaultError {
    VaultError::Io(e.to_string())
}

fn aad(version: u32, key_type: KeyType) -> Vec<u8> {
    format!("unveil-vault-v{version}:{}", key_type.as_str()).into_bytes()
}

#[async_trait]
impl AuthVerifier for SeedVault {
    async fn verify(&self, password: &str) -> Result<SecretPhrase, AuthError> {
        // Argon2id is deliberately slow; keep it off the async workers.
        let vault = self.clone();
        let password = Zeroizing::new(password.to_string());
        let unlocked = tokio::task::spawn_blocking(move || vault.unlock(&password))
            .await
            .map_err(|e| AuthError::VerifierUnavailable(e.to_string()))?;
        unlocked.map_err(|e| match e {
            VaultError::DecryptionFailed => AuthError::InvalidPassword,
            other => {
                tracing::warn!("Vault unlock failed: {other}");
                AuthError::VerifierUnavailable(other.to_string())
            }
        })
    }
}
