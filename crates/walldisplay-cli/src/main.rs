//! Command-line interface for the Piwigo Wall Display bridge.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::Mutex;
use tracing::{info, warn};
use walldisplay_core::config::env_vars;
use walldisplay_core::{
    Coordinator, DisplayMode, ItemChange, ItemKind, Observer, SessionedClient, Snapshot,
    ToggleableItem, WallDisplayConfig, WallDisplayError,
};

/// Piwigo Wall Display - Control which albums and tags a wall display shows.
#[derive(Parser, Debug)]
#[command(name = "walldisplay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Piwigo base URL (overrides config and environment).
    #[arg(long, global = true)]
    host: Option<String>,

    /// Piwigo user name.
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Piwigo password.
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List albums, tags and the display mode.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Switch an album or tag on or off.
    Set {
        /// Unique key of the item, as shown by `list`.
        key: String,
        /// New state.
        #[arg(value_enum)]
        state: SwitchState,
    },
    /// Select the display mode.
    Mode {
        /// Show photos by album or by tag.
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Poll the server and log every change until interrupted.
    Watch {
        /// Polling interval in seconds (defaults to the configured scan interval).
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SwitchState {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Album,
    Tag,
}

impl From<ModeArg> for DisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Album => DisplayMode::Album,
            ModeArg::Tag => DisplayMode::Tag,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let client = Arc::new(SessionedClient::from_config(&config)?);
    let coordinator = Arc::new(Coordinator::new(client));

    match args.command {
        Command::List { json } => run_list(&coordinator, json).await,
        Command::Set { key, state } => run_set(&coordinator, &key, state).await,
        Command::Mode { mode } => run_mode(&coordinator, mode.into()).await,
        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.scan_interval());
            run_watch(coordinator, interval).await
        }
    }
}

fn init_logging(verbose: bool) {
    // Check if JSON logging is requested (for service deployments)
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "walldisplay={level},walldisplay_core={level},warn",
            level = default_level
        ))
    });

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Config file, then environment, then command-line flags.
fn load_config(args: &Args) -> Result<WallDisplayConfig> {
    let base = match &args.config {
        Some(path) => WallDisplayConfig::load(path)?,
        None => WallDisplayConfig::default(),
    };
    let mut config = base.with_env_overrides();

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }

    config.validate().context("Incomplete connection settings")?;
    Ok(config)
}

async fn run_list(coordinator: &Coordinator, json: bool) -> Result<()> {
    let snapshot = coordinator.refresh().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.as_ref())?);
        return Ok(());
    }

    for kind in [ItemKind::Album, ItemKind::Tag] {
        for item in snapshot.items_of(kind) {
            println!("{}", format_item(item));
        }
    }
    if let Some(mode) = snapshot.mode() {
        let options: Vec<&str> = DisplayMode::OPTIONS.iter().map(|m| m.label()).collect();
        println!("mode  {:<6} (options: {})", mode, options.join(", "));
    }
    Ok(())
}

fn format_item(item: &ToggleableItem) -> String {
    format!(
        "{:<5} {:<4} {:<40} {}",
        item.kind.to_string(),
        item.state.to_string(),
        item.unique_key,
        item.breadcrumb_name
    )
}

async fn run_set(coordinator: &Coordinator, key: &str, state: SwitchState) -> Result<()> {
    coordinator.refresh().await?;
    match state {
        SwitchState::On => coordinator.turn_on(key).await?,
        SwitchState::Off => coordinator.turn_off(key).await?,
    }

    let item = coordinator
        .snapshot()
        .await
        .and_then(|snapshot| snapshot.find(key).cloned())
        .with_context(|| format!("'{}' disappeared after the update", key))?;
    println!("{}", format_item(&item));
    Ok(())
}

async fn run_mode(coordinator: &Coordinator, mode: DisplayMode) -> Result<()> {
    coordinator.refresh().await?;
    coordinator.select_mode(mode).await?;

    let current = coordinator
        .snapshot()
        .await
        .and_then(|snapshot| snapshot.mode())
        .context("Server did not report a display mode")?;
    println!("mode  {}", current);
    if current != mode {
        warn!(requested = %mode, reported = %current, "Server kept a different mode");
    }
    Ok(())
}

/// Logs the differences between consecutive refreshes.
#[derive(Default)]
struct ChangeLogger {
    previous: Mutex<Option<Snapshot>>,
}

#[async_trait::async_trait]
impl Observer for ChangeLogger {
    async fn on_data(&self, snapshot: &Snapshot) {
        let mut previous = self.previous.lock().await;
        match previous.as_ref() {
            None => info!(items = snapshot.items.len(), "Initial table loaded"),
            Some(before) => {
                for change in snapshot.changes_since(before) {
                    match change {
                        ItemChange::Added(item) => {
                            info!(key = %item.unique_key, name = %item.display_name, "Item added")
                        }
                        ItemChange::Removed(item) => {
                            info!(key = %item.unique_key, name = %item.display_name, "Item removed")
                        }
                        ItemChange::StateChanged {
                            unique_key,
                            old,
                            new,
                        } => info!(key = %unique_key, %old, %new, "State changed"),
                    }
                }
            }
        }
        *previous = Some(snapshot.clone());
    }

    async fn on_error(&self, error: &WallDisplayError) {
        if error.is_unavailable() {
            warn!("Items unavailable: {}", error);
        }
    }
}

async fn run_watch(coordinator: Arc<Coordinator>, interval: Duration) -> Result<()> {
    coordinator.subscribe(Arc::new(ChangeLogger::default())).await;
    coordinator.client().connect().await?;

    let runner = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run(interval).await })
    };

    tokio::signal::ctrl_c()
        .await
        .context("Cannot listen for Ctrl-C")?;
    info!("Stopping");
    coordinator.stop().await;
    runner.abort();
    coordinator.client().disconnect();
    Ok(())
}
