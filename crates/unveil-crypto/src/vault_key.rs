use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::aead::KEY_SIZE;
use crate::error::{VaultError, VaultResult};

pub const SALT_SIZE: usize = 32;

const VAULT_KEY_INFO: &[u8] = b"unveil-vault-key-v2";

/// Upper bound on memory cost accepted from a vault file (1 GiB).
pub const MAX_MEMORY_KIB: u32 = 1024 * 1024;
/// Upper bound on passes accepted from a vault file.
pub const MAX_ITERATIONS: u32 = 64;

/// Argon2id work factor, stored alongside the vault so it can be raised
/// for new vaults without breaking old ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    fn argon2(&self) -> VaultResult<Argon2<'static>> {
        if self.memory_kib > MAX_MEMORY_KIB || self.iterations > MAX_ITERATIONS {
            return Err(VaultError::DerivationFailed(format!(
                "KDF cost out of range: {} KiB, {} passes",
                self.memory_kib, self.iterations
            )));
        }
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| VaultError::DerivationFailed(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Key that seals the recovery phrase, derived from the vault password.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_SIZE],
}

impl VaultKey {
    /// Stretch the password with Argon2id, then bind the result to the
    /// vault format with HKDF-SHA256.
    pub fn from_password(password: &[u8], salt: &[u8], kdf: &KdfParams) -> VaultResult<Self> {
        let mut stretched = Zeroizing::new([0u8; KEY_SIZE]);
        kdf.argon2()?
            .hash_password_into(password, salt, &mut stretched[..])
            .map_err(|e| VaultError::DerivationFailed(e.to_string()))?;

        let hk = Hkdf::<Sha256>::new(Some(salt), &stretched[..]);
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand(VAULT_KEY_INFO, &mut bytes)
            .map_err(|e| VaultError::DerivationFailed(e.to_string()))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Fresh random salt from the system CSPRNG.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}
