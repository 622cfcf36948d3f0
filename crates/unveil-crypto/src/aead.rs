use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    XChaCha20Poly1305,
};

use crate::error::{VaultError, VaultResult};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 24;

/// Seal `plaintext` with XChaCha20-Poly1305, binding `aad` into the tag.
/// Returns (ciphertext, nonce).
pub fn seal(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8; KEY_SIZE],
) -> VaultResult<(Vec<u8>, [u8; NONCE_SIZE])> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| VaultError::EncryptionFailed)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(&nonce);
    Ok((ciphertext, nonce_bytes))
}

/// Open a sealed payload. Fails on wrong key, wrong `aad` or any tampering.
pub fn open(
    ciphertext: &[u8],
    aad: &[u8],
    nonce: &[u8; NONCE_SIZE],
    key: &[u8; KEY_SIZE],
) -> VaultResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = chacha20poly1305::XNonce::from_slice(nonce);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| VaultError::DecryptionFailed)
}
