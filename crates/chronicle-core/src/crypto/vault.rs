//! Master key vault.
//!
//! One random master key per installation encrypts everything persisted
//! to disk. The vault stores that key wrapped under a password-derived
//! key in a single file laid out as `salt ‖ nonce ‖ ciphertext`.
//!
//! A password change re-wraps the *same* master key under a new salt and
//! derived key; the master key bytes are never rotated, so data encrypted
//! before the change stays decryptable after it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::cipher;
use crate::crypto::key::{derive_key, SecretKey, KEY_SIZE};
use crate::crypto::passphrase::validate_password;
use crate::error::{ChronicleError, Result};
use crate::fs;

/// Length of the KDF salt stored at the head of the vault file.
pub const SALT_SIZE: usize = 16;

/// Outcome of a password change.
///
/// Expected failures (wrong current password, weak new password) are
/// reported here rather than as errors; only I/O and crypto faults
/// propagate as `ChronicleError`.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub success: bool,
    pub message: String,
}

impl PasswordChange {
    fn changed(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Cached unlock result: the master key plus an opaque token identifying
/// the password that produced it. The plaintext password is never kept.
struct CacheEntry {
    token: [u8; 32],
    key: SecretKey,
}

/// Password-wrapped storage of the installation's master key.
pub struct MasterKeyVault {
    path: PathBuf,
    cache: Mutex<Option<CacheEntry>>,
}

impl MasterKeyVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the vault file exists on disk.
    pub async fn is_initialized(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Bootstrap the vault with `password`, or validate it against an
    /// existing vault.
    ///
    /// Idempotent: if the vault already exists this unlocks with
    /// `password` and treats success as a no-op. A wrong password or a
    /// corrupt file propagates as `AuthenticationFailed`.
    pub async fn initialize(&self, password: &str) -> Result<()> {
        match self.unlock(password).await {
            Ok(_) => Ok(()),
            Err(ChronicleError::NotInitialized) => self.bootstrap(password).await,
            Err(err) => Err(err),
        }
    }

    /// Decrypt and return the master key.
    ///
    /// # Errors
    ///
    /// `NotInitialized` if the vault file is absent, `AuthenticationFailed`
    /// if the password is wrong or the file is corrupt.
    pub async fn unlock(&self, password: &str) -> Result<SecretKey> {
        let token = password_token(password);
        if let Some(key) = self.cached(&token) {
            return Ok(key);
        }

        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ChronicleError::NotInitialized)
            }
            Err(err) => return Err(err.into()),
        };
        if raw.len() <= SALT_SIZE {
            return Err(ChronicleError::AuthenticationFailed);
        }

        let (salt, wrapped) = raw.split_at(SALT_SIZE);
        let salt: [u8; SALT_SIZE] = salt
            .try_into()
            .map_err(|_| ChronicleError::AuthenticationFailed)?;
        let wrapping_key = derive_wrapping_key(password, salt).await?;

        let master_bytes = Zeroizing::new(cipher::open(&wrapping_key, wrapped)?);
        let master_bytes: [u8; KEY_SIZE] = master_bytes
            .as_slice()
            .try_into()
            .map_err(|_| ChronicleError::AuthenticationFailed)?;
        let master = SecretKey::from_bytes(master_bytes);

        self.remember(token, master.clone());
        Ok(master)
    }

    /// True iff `unlock(password)` succeeds. Never errors.
    pub async fn verify(&self, password: &str) -> bool {
        self.unlock(password).await.is_ok()
    }

    /// Change the vault password, keeping the master key identical.
    ///
    /// If the vault was never initialized this bootstraps it with
    /// `new_password` instead (the old password is ignored). A wrong old
    /// password is an expected failure and reported in the result, not as
    /// an error.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<PasswordChange> {
        if let Err(err) = validate_password(new_password) {
            return Ok(PasswordChange::rejected(err.to_string()));
        }

        let master = match self.unlock(old_password).await {
            Ok(master) => master,
            Err(ChronicleError::NotInitialized) => {
                self.bootstrap(new_password).await?;
                return Ok(PasswordChange::changed("Password set"));
            }
            Err(ChronicleError::AuthenticationFailed) | Err(ChronicleError::InvalidInput(_)) => {
                return Ok(PasswordChange::rejected("Current password is incorrect"));
            }
            Err(err) => return Err(err),
        };

        self.write_wrapped(new_password, &master).await?;
        self.invalidate_cache();
        self.remember(password_token(new_password), master);
        info!("vault password changed");
        Ok(PasswordChange::changed("Password changed"))
    }

    /// Drop any cached master key.
    pub fn invalidate_cache(&self) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = None;
        }
    }

    async fn bootstrap(&self, password: &str) -> Result<()> {
        validate_password(password)?;
        let master = SecretKey::generate()?;
        self.write_wrapped(password, &master).await?;
        self.remember(password_token(password), master);
        info!(path = %self.path.display(), "vault bootstrapped");
        Ok(())
    }

    /// Wrap `master` under a key derived from `password` with a fresh salt
    /// and atomically replace the vault file.
    async fn write_wrapped(&self, password: &str, master: &SecretKey) -> Result<()> {
        let mut salt = [0u8; SALT_SIZE];
        getrandom::getrandom(&mut salt)
            .map_err(|e| ChronicleError::Crypto(format!("Salt generation failed: {}", e)))?;

        let wrapping_key = derive_wrapping_key(password, salt).await?;
        let wrapped = cipher::seal(&wrapping_key, master.as_bytes())?;

        let mut contents = Vec::with_capacity(SALT_SIZE + wrapped.len());
        contents.extend_from_slice(&salt);
        contents.extend_from_slice(&wrapped);

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || fs::write_atomic(&path, &contents))
            .await
            .map_err(|e| ChronicleError::Storage(format!("Vault write task failed: {}", e)))??;
        Ok(())
    }

    fn cached(&self, token: &[u8; 32]) -> Option<SecretKey> {
        let guard = self.cache.lock().ok()?;
        guard
            .as_ref()
            .filter(|entry| &entry.token == token)
            .map(|entry| entry.key.clone())
    }

    fn remember(&self, token: [u8; 32], key: SecretKey) {
        if let Ok(mut guard) = self.cache.lock() {
            *guard = Some(CacheEntry { token, key });
        } else {
            debug!("master key cache lock poisoned; skipping memoization");
        }
    }
}

/// Opaque cache token for a password: its SHA-256 digest. Comparing
/// tokens avoids holding the plaintext password beyond the unlock call.
fn password_token(password: &str) -> [u8; 32] {
    let digest = Sha256::digest(password.as_bytes());
    let mut token = [0u8; 32];
    token.copy_from_slice(&digest);
    token
}

/// Argon2id is CPU/memory-bound; run it off the async executor.
async fn derive_wrapping_key(password: &str, salt: [u8; SALT_SIZE]) -> Result<SecretKey> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || derive_key(&password, &salt))
        .await
        .map_err(|e| ChronicleError::Crypto(format!("Key derivation task failed: {}", e)))?
}
