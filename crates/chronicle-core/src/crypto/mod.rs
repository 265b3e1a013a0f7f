//! Cryptographic operations for Chronicle.
//!
//! Envelope encryption: a random 256-bit *master key* encrypts everything
//! persisted to disk; the master key itself is wrapped under a key derived
//! from the user's password.
//!
//! - **Argon2id** for password key derivation (memory-hard)
//! - **XChaCha20-Poly1305** for authenticated encryption
//! - Key material zeroized from memory on drop
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the encrypted store and wrapped-key files
//! - Offline brute-force attacks on the password
//!
//! We do NOT defend against:
//! - A compromised OS or unlocked session
//! - Access to process memory while the master key is cached

pub mod cipher;
pub mod key;
pub mod passphrase;
pub mod vault;

pub use key::{derive_key, SecretKey};
pub use passphrase::validate_password;
pub use vault::{MasterKeyVault, PasswordChange};
