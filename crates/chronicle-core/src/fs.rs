//! Filesystem utilities for atomic file replacement.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Atomically rename a file, with fallback for platforms where rename fails
/// if the target exists.
///
/// On some platforms (notably Windows), `fs::rename` fails when the
/// destination already exists; in that case the destination is removed and
/// the rename retried. If the rename ultimately fails, the temp file is
/// cleaned up.
///
/// # Errors
///
/// Returns an error if the rename fails even after the fallback attempt.
pub fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "Atomic rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

/// Write `bytes` to `destination` via a temporary sibling and an atomic
/// rename, creating parent directories as needed.
///
/// A reader of `destination` observes either the previous contents or the
/// full new contents, never a partial write.
pub fn write_atomic(destination: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let temp_path = temp_sibling(destination)?;
    fs::write(&temp_path, bytes)?;
    rename_with_fallback(&temp_path, destination)
}

fn temp_sibling(destination: &Path) -> io::Result<PathBuf> {
    let Some(name) = destination.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Destination has no file name: {}", destination.display()),
        ));
    };
    let mut temp_name = name.to_os_string();
    temp_name.push(".tmp");
    Ok(destination.with_file_name(temp_name))
}
