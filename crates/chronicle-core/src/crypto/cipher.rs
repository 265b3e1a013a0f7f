//! Authenticated encryption of byte buffers.
//!
//! XChaCha20-Poly1305 with a fresh random 24-byte nonce per encryption.
//! Sealed buffers are laid out as `nonce ‖ ciphertext` where the
//! ciphertext includes the 16-byte authentication tag.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};

use crate::crypto::key::SecretKey;
use crate::error::{ChronicleError, Result};

/// XChaCha20-Poly1305 nonce length in bytes.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypt `plaintext` under `key`, returning `nonce ‖ ciphertext`.
///
/// A fresh random nonce is generated on every call and is never reused
/// with the same key.
pub fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| ChronicleError::Crypto("Invalid key length".to_string()))?;

    let mut nonce = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| ChronicleError::Crypto(format!("Nonce generation failed: {}", e)))?;

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| ChronicleError::Crypto("Encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a `nonce ‖ ciphertext` buffer produced by [`seal`].
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the buffer is truncated, corrupted,
/// or was encrypted under a different key. Never returns garbage.
pub fn open(key: &SecretKey, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(ChronicleError::AuthenticationFailed);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    let cipher = XChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|_| ChronicleError::Crypto("Invalid key length".to_string()))?;

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| ChronicleError::AuthenticationFailed)
}
