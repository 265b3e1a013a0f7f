//! Data directory resolution and config file handling.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use chronicle_core::CaptureConfig;

/// Name of the config file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct ChronicleConfig {
    pub capture: CaptureConfig,
}

/// Resolve the data directory: `--data-dir` flag (which clap also fills
/// from `CHRONICLE_DATA_DIR`), falling back to `~/.chronicle`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    let home = std::env::var("HOME")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .context("HOME is not set; pass --data-dir or set CHRONICLE_DATA_DIR")?;
    Ok(PathBuf::from(home).join(".chronicle"))
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

pub fn read_config(data_dir: &Path) -> anyhow::Result<ChronicleConfig> {
    let path = config_path(data_dir);
    let raw = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "No config at {}\n\nRun:\n  chronicle init --capture-binary /path/to/helper",
            path.display()
        )
    })?;
    toml::from_str(&raw).with_context(|| format!("Invalid config at {}", path.display()))
}

pub fn write_config(data_dir: &Path, config: &ChronicleConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;
    let raw = toml::to_string_pretty(config).context("Failed to serialize config")?;
    let path = config_path(data_dir);
    std::fs::write(&path, raw)
        .with_context(|| format!("Failed to write config at {}", path.display()))
}
