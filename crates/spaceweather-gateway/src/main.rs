// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Space-weather sync gateway
//!
//! Runs the incremental NOAA feed sync on a timer and exposes a manual
//! trigger and a health check over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the default port, syncing every 60 seconds
//! SINK_URL=https://influx.example.com/api/v1/push/influx/write \
//! SINK_USERNAME=12345 SINK_API_KEY=glc_... TRIGGER_TOKEN=s3cret \
//! spaceweather-gateway
//!
//! # Using a configuration file
//! spaceweather-gateway --config sync.toml serve
//!
//! # Single run, outcome printed as JSON
//! spaceweather-gateway --config sync.toml once
//! ```
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET|POST /api/v1/run?token=...` - Manual sync (also `Authorization: Bearer`)
//! - `/health` and `/run` are aliases

mod config;
mod handlers;
mod routes;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{FileConfig, Overrides, Settings};
use spaceweather_sync::config::{DEFAULT_KP_URL, DEFAULT_MAG_URL, DEFAULT_WIND_URL};
use spaceweather_sync::{
    FeedConfig, HttpFetcher, HttpPusher, SinkConfig, SqliteStore, StateStore, SyncConfig, Syncer,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Syncer wired to the production collaborators.
pub type GatewaySyncer = Syncer<HttpFetcher, HttpPusher, SqliteStore>;

/// Shared application state
pub struct AppState {
    pub syncer: Arc<GatewaySyncer>,
    /// Manual trigger secret; `None` disables the trigger.
    pub trigger_token: Option<String>,
}

/// Space-weather sync gateway
#[derive(Parser, Debug)]
#[command(name = "spaceweather-gateway")]
#[command(about = "Incremental NOAA space-weather sync to an InfluxDB Line Protocol sink")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Line Protocol write endpoint
    #[arg(long, env = "SINK_URL", global = true)]
    sink_url: Option<String>,

    /// Sink basic-auth user
    #[arg(long, env = "SINK_USERNAME", global = true)]
    sink_username: Option<String>,

    /// Sink API key
    #[arg(long, env = "SINK_API_KEY", hide_env_values = true, global = true)]
    sink_api_key: Option<String>,

    /// Planetary K index feed URL
    #[arg(long, env = "KP_URL", global = true)]
    kp_url: Option<String>,

    /// Solar wind plasma feed URL
    #[arg(long, env = "WIND_URL", global = true)]
    wind_url: Option<String>,

    /// Solar wind magnetic field feed URL
    #[arg(long, env = "MAG_URL", global = true)]
    mag_url: Option<String>,

    /// Cold-start lookback in minutes (0 takes the whole feed)
    #[arg(long, env = "BOOTSTRAP_LOOKBACK_MINUTES", global = true)]
    bootstrap_lookback_minutes: Option<i64>,

    /// Manual trigger token (trigger disabled when unset)
    #[arg(long, env = "TRIGGER_TOKEN", hide_env_values = true, global = true)]
    trigger_token: Option<String>,

    /// SQLite file holding the sync state
    #[arg(long, env = "STATE_DB", global = true)]
    state_db: Option<PathBuf>,

    /// Timer period in seconds (0 disables the timer)
    #[arg(long, env = "SYNC_INTERVAL_SECS", global = true)]
    interval_secs: Option<u64>,

    /// Bind address
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// HTTP server port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP surface and run the timer (default)
    Serve,

    /// Run a single sync and print the outcome as JSON
    Once,

    /// Print the stored sync state
    State,

    /// Validate the configuration
    Validate,

    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "sync.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Some(Commands::GenConfig { ref output }) => return cmd_gen_config(output),
        Some(Commands::Validate) => return cmd_validate(&args),
        _ => {}
    }

    let settings = load_settings(&args)?;
    match args.command {
        Some(Commands::Once) => cmd_once(settings).await,
        Some(Commands::State) => cmd_state(settings).await,
        _ => cmd_serve(settings).await,
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let file = match args.config {
        Some(ref path) => FileConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        sink_url: args.sink_url.clone(),
        sink_username: args.sink_username.clone(),
        sink_api_key: args.sink_api_key.clone(),
        kp_url: args.kp_url.clone(),
        wind_url: args.wind_url.clone(),
        mag_url: args.mag_url.clone(),
        bootstrap_lookback_minutes: args.bootstrap_lookback_minutes,
        trigger_token: args.trigger_token.clone(),
        state_db: args.state_db.clone(),
        interval_secs: args.interval_secs,
        bind: args.bind.clone(),
        port: args.port,
    };
    Ok(Settings::resolve(file, overrides)?)
}

fn build_syncer(settings: &Settings) -> anyhow::Result<GatewaySyncer> {
    let store = SqliteStore::new(&settings.state_db)
        .with_context(|| format!("opening state db {}", settings.state_db.display()))?;
    let pusher = HttpPusher::from_config(settings.sync.sink.clone());
    match (pusher.url(), settings.sync.sink.credentials()) {
        (Some(url), Ok(_)) => info!("Sink: {}", url),
        (_, Err(e)) => warn!("{}; deliveries will fail until it is set", e),
        (None, Ok(_)) => {}
    }
    Ok(Syncer::new(
        settings.sync.clone(),
        HttpFetcher::new()?,
        pusher,
        store,
    ))
}

async fn cmd_serve(settings: Settings) -> anyhow::Result<()> {
    let syncer = Arc::new(build_syncer(&settings)?);

    if settings.trigger_token.is_none() {
        info!("Manual trigger disabled (no token)");
    }

    if settings.interval_secs > 0 {
        spawn_timer(Arc::clone(&syncer), settings.interval_secs);
    }

    let state = Arc::new(AppState {
        syncer,
        trigger_token: settings.trigger_token.clone(),
    });
    let app = routes::build_router(state);

    let addr = settings.listen_addr();
    info!("Space-weather gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP server: http://{}", addr);
    info!("State db: {}", settings.state_db.display());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;
    Ok(())
}

/// Start a run every `interval_secs`. Each run is its own task so a slow
/// run never delays the next tick; an overlapping run ends as busy.
fn spawn_timer(syncer: Arc<GatewaySyncer>, interval_secs: u64) {
    info!("Sync timer: every {}s", interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let syncer = Arc::clone(&syncer);
            tokio::spawn(async move {
                match syncer.run().await {
                    Ok(outcome) => info!(
                        "Scheduled sync: {:?}, {} lines",
                        outcome.status, outcome.lines
                    ),
                    Err(spaceweather_sync::SyncError::Busy) => {
                        warn!("Scheduled sync skipped: previous run still in progress")
                    }
                    Err(e) => error!("Scheduled sync failed: {}", e),
                }
            });
        }
    });
}

async fn cmd_once(settings: Settings) -> anyhow::Result<()> {
    let syncer = build_syncer(&settings)?;
    let outcome = syncer.run().await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn cmd_state(settings: Settings) -> anyhow::Result<()> {
    let store = SqliteStore::new(&settings.state_db)
        .with_context(|| format!("opening state db {}", settings.state_db.display()))?;
    match store.get().await? {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("No sync state yet (next run is a cold start)"),
    }
    Ok(())
}

fn cmd_validate(args: &Args) -> anyhow::Result<()> {
    let settings = load_settings(args)?;
    println!("Configuration valid!");
    println!();
    println!("Feeds:");
    println!("  kp:   {}", settings.sync.feeds.kp);
    println!("  wind: {}", settings.sync.feeds.wind);
    println!("  mag:  {}", settings.sync.feeds.mag);
    match settings.sync.sink.credentials() {
        Ok((url, _, _)) => println!("Sink: {}", url),
        Err(e) => println!("Sink: {}", e),
    }
    println!(
        "Bootstrap lookback: {} min",
        settings.sync.bootstrap_lookback_minutes
    );
    println!(
        "Manual trigger: {}",
        if settings.trigger_token.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    Ok(())
}

fn example_config() -> FileConfig {
    FileConfig {
        sync: SyncConfig {
            sink: SinkConfig {
                url: Some("https://influx.example.com/api/v1/push/influx/write".into()),
                username: Some("123456".into()),
                api_key: Some("changeme".into()),
            },
            feeds: FeedConfig {
                kp: DEFAULT_KP_URL.into(),
                wind: DEFAULT_WIND_URL.into(),
                mag: DEFAULT_MAG_URL.into(),
            },
            bootstrap_lookback_minutes: 180,
        },
        gateway: config::GatewayConfig {
            trigger_token: Some("changeme".into()),
            state_db: Some(PathBuf::from(config::DEFAULT_STATE_DB)),
            interval_secs: Some(config::DEFAULT_INTERVAL_SECS),
            bind: Some(config::DEFAULT_BIND.into()),
            port: Some(config::DEFAULT_PORT),
        },
    }
}

fn cmd_gen_config(output: &Path) -> anyhow::Result<()> {
    let toml_str = toml::to_string_pretty(&example_config())?;

    let content = format!(
        r#"# Space-weather sync configuration
# Generated by spaceweather-gateway gen-config

{}
"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}
