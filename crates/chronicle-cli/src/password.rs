//! Password acquisition for CLI commands.

use anyhow::Context;
use dialoguer::Password;
use secrecy::SecretString;

/// Get a password from `CHRONICLE_PASSWORD`, or prompt interactively.
pub fn obtain_password(prompt: &str, confirm: bool) -> anyhow::Result<SecretString> {
    if let Ok(value) = std::env::var("CHRONICLE_PASSWORD") {
        if !value.trim().is_empty() {
            return Ok(SecretString::from(value));
        }
    }
    prompt_password(prompt, confirm)
}

/// Prompt interactively, ignoring the environment. Used where one command
/// needs two different passwords (passwd).
pub fn prompt_password(prompt: &str, confirm: bool) -> anyhow::Result<SecretString> {
    let mut input = Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Confirm password", "Passwords do not match");
    }
    let value = input.interact().context("Failed to read password")?;
    Ok(SecretString::from(value))
}
