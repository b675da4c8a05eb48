// # ddnsd - OVH DynHost updater daemon
//
// Thin integration layer: all decision, retry and persistence logic lives in
// ddns-core. This binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Wires the HTTP IP lookup, the OVH provider and the file state store
// 4. Runs the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// ### Required
// - `OVH_HOST`: DynHost hostname to keep updated
// - `OVH_USER`: DynHost login
// - `OVH_PASS`: DynHost password
//
// ### Optional
// - `MAX_RETRIES_PER_UPDATE`: Provider attempts per update (default 1)
// - `CHECK_INTERVAL_SECONDS`: Seconds between checks (default 60)
// - `MIN_SECONDS_BETWEEN_UPDATES`: Reported only (default 120)
// - `FORCE_UPDATE_HOURS`: Push an unchanged IP after this long (default 24)
// - `RETRY_INTERVAL_SECONDS`: Gap between attempts (default 10)
// - `STATE_DIR`: Directory for `<OVH_HOST>.json` (default /data)
// - `OVH_ENDPOINT`: Update endpoint
// - `IP_SERVICES`: Comma-separated IP service URLs
// - `DDNS_MODE`: `live` or `dry-run`
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export OVH_HOST=home.example.com
// export OVH_USER=example.com-home
// export OVH_PASS=secret
// export STATE_DIR=/var/lib/ddns
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::shutdown;
use ddns_core::{DdnsEngine, FileStateStore, UpdaterConfig};
use ddns_ip_http::HttpIpLookup;
use ddns_provider_ovh::OvhProvider;
use std::future::Future;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match UpdaterConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd for {}", config.hostname);
    for line in config.summary_lines() {
        info!("{}", line);
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: UpdaterConfig) -> Result<()> {
    let state_path = config.state_file_path();
    let state_store = FileStateStore::new(&state_path)
        .await
        .with_context(|| format!("Failed to open state file {}", state_path.display()))?;

    let provider = OvhProvider::from_config(&config).context("Failed to create OVH provider")?;
    let ip_lookup = HttpIpLookup::new().context("Failed to create IP lookup")?;

    let (mut engine, mut events) = DdnsEngine::new(
        Box::new(ip_lookup),
        Box::new(provider),
        Box::new(state_store),
        config.hostname.clone(),
        config.ip_services.clone(),
        config.engine.clone(),
    )?;

    // Nothing consumes events beyond debug logging
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (trigger, shutdown) = shutdown::channel();
    let stop_signal = shutdown_signal()?;
    tokio::spawn(async move {
        let signal = stop_signal.await;
        info!("Received {}", signal);
        info!("Received stop signal, exiting gracefully.");
        trigger.trigger();
    });

    engine.run(shutdown).await?;

    Ok(())
}

/// Install SIGTERM and SIGINT handlers
///
/// The returned future resolves with the name of the first signal received.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = &'static str> + Send + 'static> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
        "SIGINT"
    })
}
