//! Symmetric keys and password key derivation using Argon2id.

use argon2::Argon2;
use zeroize::ZeroizeOnDrop;

use crate::error::{ChronicleError, Result};

/// Argon2id parameters.
///
/// These values balance security and usability:
/// - Memory: 64 MB (64 * 1024 KB)
/// - Iterations: 3
/// - Parallelism: 1 (single-threaded for simplicity)
const ARGON2_MEMORY_KB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

/// Length of a symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit symmetric key.
///
/// Used both for the master key and for password-derived wrapping keys.
/// Key material is securely zeroized from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Create a key from raw bytes.
    ///
    /// The caller is responsible for ensuring the bytes come from a secure
    /// source (the OS RNG, or a decrypted wrapped key).
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { key: bytes }
    }

    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| ChronicleError::Crypto(format!("Random key generation failed: {}", e)))?;
        Ok(Self { key: bytes })
    }

    /// Get a reference to the raw key bytes.
    ///
    /// Avoid storing or logging this value. Use only for immediate
    /// encryption operations.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a password using Argon2id.
///
/// Same password + salt always produces the same key; a different salt
/// produces an unrelated key, so the salt must be stored alongside the
/// wrapped artifact.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty password or a salt shorter than
/// 16 bytes, `Crypto` if derivation itself fails.
pub fn derive_key(password: &str, salt: &[u8]) -> Result<SecretKey> {
    if password.is_empty() {
        return Err(ChronicleError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    if salt.len() < 16 {
        return Err(ChronicleError::InvalidInput(
            "Salt must be at least 16 bytes".to_string(),
        ));
    }

    let params = argon2::Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_SIZE),
    )
    .map_err(|e| ChronicleError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key_bytes = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key_bytes)
        .map_err(|e| ChronicleError::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(SecretKey::from_bytes(key_bytes))
}
