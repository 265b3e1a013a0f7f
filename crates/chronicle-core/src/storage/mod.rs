//! Storage for Chronicle.
//!
//! Three layers, bottom-up:
//! - **logitems**: the in-memory row store with append-or-rotate
//!   semantics, exported and re-imported as one opaque byte blob
//! - **blob**: master-key encryption of persisted artifacts
//! - **encrypted_file**: atomic, mutually-exclusive reads and writes of a
//!   blob's on-disk home
//!
//! Nothing in this module ever writes plaintext records to disk; the only
//! plaintext path is reading a legacy unencrypted store file, which is
//! removed on the next write.

pub mod blob;
pub mod encrypted_file;
pub mod logitems;

pub use blob::EncryptedBlobStore;
pub use encrypted_file::EncryptedFile;
pub use logitems::{Logitem, LogitemStore};
