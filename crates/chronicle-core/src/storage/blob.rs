//! Master-key encryption of persisted artifacts.
//!
//! Every blob that reaches disk goes through this store, so the master
//! key (never the password) is the only key protecting bulk data.

use crate::crypto::cipher;
use crate::crypto::key::SecretKey;
use crate::error::Result;

/// Encrypts and decrypts byte blobs under the installation's master key.
#[derive(Clone)]
pub struct EncryptedBlobStore {
    master: SecretKey,
}

impl EncryptedBlobStore {
    pub fn new(master: SecretKey) -> Self {
        Self { master }
    }

    /// Encrypt `plaintext` as `nonce ‖ ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        cipher::seal(&self.master, plaintext)
    }

    /// Decrypt a blob produced by [`Self::seal`].
    ///
    /// Fails with `AuthenticationFailed` if the blob is truncated,
    /// corrupted, or was sealed under a different master key.
    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>> {
        cipher::open(&self.master, blob)
    }
}
