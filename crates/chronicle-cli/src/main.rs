//! Chronicle CLI - an encrypted local activity log.
//!
//! Drives the capture engine from the command line: vault bootstrap,
//! the capture daemon, password changes, and transcript output.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use chronicle_core::crypto::vault::MasterKeyVault;
use chronicle_core::engine::{CaptureEngine, MASTER_KEY_FILE, STORE_FILE};
use chronicle_core::render::render_transcript;
use chronicle_core::storage::encrypted_file::encrypted_sibling;
use chronicle_core::{CaptureConfig, VERSION};

mod config;
mod password;

/// Chronicle - an encrypted local activity log
#[derive(Parser)]
#[command(name = "chronicle")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory holding the vault, store, and config
    #[arg(long, global = true, env = "CHRONICLE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the vault and write a default config
    Init {
        /// Path to the native capture helper binary
        #[arg(long, value_name = "PATH")]
        capture_binary: PathBuf,

        /// Application-name substrings to exclude from capture
        #[arg(long = "block", value_name = "SUBSTRING")]
        blocked: Vec<String>,
    },

    /// Run the capture daemon until interrupted
    Run,

    /// Change the vault password
    Passwd,

    /// Print the decrypted activity transcript
    Show {
        /// Only records at or after this time (RFC3339, or a window like "24h")
        #[arg(long, value_name = "WHEN")]
        since: Option<String>,

        /// Output raw records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report vault and store status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let data_dir = config::resolve_data_dir(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init {
            capture_binary,
            blocked,
        } => cmd_init(&data_dir, capture_binary, blocked).await,
        Commands::Run => cmd_run(&data_dir).await,
        Commands::Passwd => cmd_passwd(&data_dir).await,
        Commands::Show { since, json } => cmd_show(&data_dir, since.as_deref(), json).await,
        Commands::Status => cmd_status(&data_dir).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn cmd_init(
    data_dir: &std::path::Path,
    capture_binary: PathBuf,
    blocked: Vec<String>,
) -> anyhow::Result<()> {
    let vault = MasterKeyVault::new(data_dir.join(MASTER_KEY_FILE));
    let existed = vault.is_initialized().await;

    let password = password::obtain_password("New password", !existed)?;
    vault
        .initialize(password.expose_secret())
        .await
        .context("Failed to initialize vault")?;

    if !config::config_path(data_dir).exists() {
        let mut capture = CaptureConfig::new(capture_binary);
        capture.blocked_apps = blocked;
        config::write_config(data_dir, &config::ChronicleConfig { capture })?;
    }

    if existed {
        println!("Vault already initialized at {}", data_dir.display());
    } else {
        println!("Initialized chronicle data dir at {}", data_dir.display());
    }
    Ok(())
}

async fn cmd_run(data_dir: &std::path::Path) -> anyhow::Result<()> {
    let cfg = config::read_config(data_dir)?;
    let password = password::obtain_password("Password", false)?;

    let engine = CaptureEngine::open(data_dir, cfg.capture, password.expose_secret())
        .await
        .map_err(describe_open_error)?;

    engine.start_capture();
    info!("capture running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    info!("interrupt received; shutting down");
    engine.shutdown().await;
    Ok(())
}

async fn cmd_passwd(data_dir: &std::path::Path) -> anyhow::Result<()> {
    let vault = MasterKeyVault::new(data_dir.join(MASTER_KEY_FILE));

    let old = if vault.is_initialized().await {
        password::prompt_password("Current password", false)?
    } else {
        secrecy::SecretString::from(String::new())
    };
    let new = password::prompt_password("New password", true)?;

    let outcome = vault
        .change_password(old.expose_secret(), new.expose_secret())
        .await
        .context("Failed to change password")?;

    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        anyhow::bail!("{}", outcome.message)
    }
}

async fn cmd_show(
    data_dir: &std::path::Path,
    since: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = config::read_config(data_dir)?;
    let password = password::obtain_password("Password", false)?;

    let engine = CaptureEngine::open(data_dir, cfg.capture, password.expose_secret())
        .await
        .map_err(describe_open_error)?;

    let items = match since {
        Some(raw) => engine.logitems_since(parse_since(raw)?)?,
        None => engine.all_logitems()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print!("{}", render_transcript(&items));
    }
    Ok(())
}

async fn cmd_status(data_dir: &std::path::Path) -> anyhow::Result<()> {
    let vault = MasterKeyVault::new(data_dir.join(MASTER_KEY_FILE));
    println!("Data dir: {}", data_dir.display());
    println!(
        "Vault:    {}",
        if vault.is_initialized().await {
            "initialized"
        } else {
            "not initialized (run `chronicle init`)"
        }
    );

    let store_path = encrypted_sibling(&data_dir.join(STORE_FILE));
    match tokio::fs::metadata(&store_path).await {
        Ok(meta) => println!("Store:    {} ({} bytes)", store_path.display(), meta.len()),
        Err(_) => println!("Store:    not yet written"),
    }

    println!(
        "Config:   {}",
        if config::config_path(data_dir).exists() {
            "present"
        } else {
            "missing (run `chronicle init`)"
        }
    );
    Ok(())
}

fn describe_open_error(err: chronicle_core::ChronicleError) -> anyhow::Error {
    match err {
        chronicle_core::ChronicleError::NotInitialized => {
            anyhow::anyhow!("Vault is not initialized; run `chronicle init` first")
        }
        chronicle_core::ChronicleError::AuthenticationFailed => {
            anyhow::anyhow!("Incorrect password")
        }
        other => other.into(),
    }
}

/// Parse `--since`: RFC3339, or a relative window like "90m", "24h", "7d".
fn parse_since(raw: &str) -> anyhow::Result<i64> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).timestamp_millis());
    }

    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let (digits, unit) = trimmed.split_at(trimmed.len() - 1);
        if let Ok(amount) = digits.parse::<i64>() {
            let window = match unit {
                "s" => Some(Duration::seconds(amount)),
                "m" => Some(Duration::minutes(amount)),
                "h" => Some(Duration::hours(amount)),
                "d" => Some(Duration::days(amount)),
                _ => None,
            };
            if let Some(window) = window {
                return Ok((Utc::now() - window).timestamp_millis());
            }
        }
    }

    anyhow::bail!(
        "Invalid --since value '{}'; use RFC3339 or a window like 24h",
        raw
    )
}
