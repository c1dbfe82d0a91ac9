//! qwallet-cli — command-line driver for the simulated wallet session.
//!
//! Lists the currency catalog, generates mock wallets with simulated
//! balance checks, and runs the periodic auto-scan in the foreground.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use qwallet_core::{BalanceSnapshot, CurrencyCode};
use qwallet_session::{SessionConfig, SessionEvent, SessionSnapshot, WalletSession};

/// Simulated crypto wallet dashboard, terminal edition.
#[derive(Parser)]
#[command(name = "qwallet-cli")]
#[command(version, about = "Mock wallets, simulated balances. No real keys, no network.")]
struct Cli {
    /// Session config file (default: <config dir>/qwallet/config.toml if it exists).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported currencies.
    Catalog,
    /// Generate a wallet and check its balance.
    Generate(GenerateArgs),
    /// Generate a wallet and auto-scan it until interrupted.
    Watch(WatchArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Currency code (default: the configured default currency).
    #[arg(short, long)]
    currency: Option<String>,

    /// Extra balance checks after the first one.
    #[arg(short, long, default_value_t = 0)]
    scans: u32,

    /// Print the full private key instead of a preview.
    #[arg(long)]
    show_key: bool,

    /// Print the session snapshot as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WatchArgs {
    /// Currency code (default: the configured default currency).
    #[arg(short, long)]
    currency: Option<String>,

    /// Stop after this many seconds (default: run until Ctrl+C).
    #[arg(short, long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Catalog => show_catalog(&config),
        Commands::Generate(args) => generate(config, args).await,
        Commands::Watch(args) => watch(config, args).await,
    }
}

/// Print the catalog, including configured rows.
fn show_catalog(config: &SessionConfig) -> Result<()> {
    let catalog = config.catalog().context("Invalid currency rows in config")?;

    println!(
        "{:<6} {:<10} {:<7} {:>6} {:>10} {:>8}",
        "CODE", "NAME", "PREFIX", "LENGTH", "SCALE", "DECIMALS"
    );
    for entry in catalog.entries() {
        println!(
            "{:<6} {:<10} {:<7} {:>6} {:>10} {:>8}",
            entry.code,
            entry.name,
            entry.address_prefix,
            entry.address_length,
            entry.balance_scale,
            entry.decimal_places
        );
    }
    println!("\nUnlisted codes use the {} row.", catalog.fallback().name);
    Ok(())
}

/// Generate a wallet, run `--scans` extra checks and print the result.
async fn generate(config: SessionConfig, args: GenerateArgs) -> Result<()> {
    let currency = resolve_currency(args.currency, &config);
    let session = WalletSession::new(config).context("Could not build wallet session")?;

    session
        .generate(currency.clone())
        .await
        .with_context(|| format!("Failed to generate {currency} wallet"))?;
    for _ in 0..args.scans {
        session.check_balance().await.context("Balance check failed")?;
    }

    let snapshot = session.snapshot();
    if args.json {
        let value = snapshot_json(&snapshot, args.show_key)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("\n=== WALLET GENERATED ===");
    print_identity(&snapshot, args.show_key);
    println!("Balance:  {} {}", snapshot.balance, currency);
    println!("\nScan history (newest first):");
    for reading in &snapshot.history {
        print_reading(reading);
    }
    Ok(())
}

/// Generate a wallet and print every auto-scan reading as it lands.
async fn watch(config: SessionConfig, args: WatchArgs) -> Result<()> {
    let currency = resolve_currency(args.currency, &config);
    let period = config.auto_scan_interval();
    let session = WalletSession::new(config).context("Could not build wallet session")?;
    let mut events = session.events();

    session
        .generate(currency.clone())
        .await
        .with_context(|| format!("Failed to generate {currency} wallet"))?;
    print_identity(&session.snapshot(), false);

    session
        .start_auto_scan()
        .context("Could not start auto-scan")?;
    println!(
        "\nAuto-scan every {}s. Press Ctrl+C to stop.\n",
        period.as_secs_f64()
    );

    let deadline = async {
        match args.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("watch duration elapsed");
                break;
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("interrupted");
                break;
            }
            event = events.recv() => match event {
                Ok(SessionEvent::BalanceUpdated { snapshot, .. }) => print_reading(&snapshot),
                Ok(SessionEvent::StaleResultDiscarded { reason }) => {
                    println!("  (discarded late reading: {reason})");
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "lagged behind on session events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    session.stop_auto_scan();
    let history = session.history();
    println!(
        "\nStopped after {} readings; last scan {}.",
        history.len(),
        session.last_scan_age()
    );
    Ok(())
}

fn print_identity(snapshot: &SessionSnapshot, show_key: bool) {
    let Some(identity) = &snapshot.identity else {
        return;
    };
    let key = if show_key {
        identity.private_key().to_string()
    } else {
        identity.private_key_preview()
    };
    println!("Currency: {}", identity.currency);
    println!("Address:  {}", identity.address);
    println!("Key:      {key}");
    if let Some(url) = &snapshot.explorer_url {
        println!("Explorer: {url}");
    }
}

fn print_reading(reading: &BalanceSnapshot) {
    println!(
        "  {}  {:>20}  {:>16}",
        reading.timestamp.format("%H:%M:%S"),
        reading.balance,
        reading.display_delta()
    );
}

/// Snapshot as JSON, with the private key cut to its preview unless
/// `show_key` is set.
fn snapshot_json(snapshot: &SessionSnapshot, show_key: bool) -> Result<Value> {
    let mut value = serde_json::to_value(snapshot).context("Could not serialize snapshot")?;
    if !show_key {
        if let (Some(identity), Some(obj)) = (
            &snapshot.identity,
            value.get_mut("identity").and_then(Value::as_object_mut),
        ) {
            obj.insert(
                "private_key".into(),
                Value::String(identity.private_key_preview()),
            );
        }
    }
    Ok(value)
}

fn resolve_currency(arg: Option<String>, config: &SessionConfig) -> CurrencyCode {
    arg.map(CurrencyCode::from)
        .unwrap_or_else(|| config.default_currency.clone())
}

/// Load the session config from `path`, or from the default location when
/// that file exists. Environment overrides apply either way.
fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path().filter(|p| p.exists()),
    };
    SessionConfig::load(path.as_deref()).with_context(|| match &path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load config from environment".to_string(),
    })
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("qwallet").join("config.toml"))
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
