// # ddnsd - DDNS Daemon
//
// Keeps one Alibaba Cloud DNS "A" record pointed at this host's public IPv4
// address.
//
// This is a THIN integration layer: it loads settings, wires the HTTP IP
// source and the AliDNS provider into a `DdnsEngine`, and hands the engine
// to the `Scheduler`. All reconciliation logic lives in ddns-core.
//
// ## Configuration
//
// A TOML file (`DDNS_CONFIG_PATH`, else `./config.toml` if present) with
// environment variables layered on top:
//
// - `DDNS_DOMAIN` / `DomainName`: domain holding the record
// - `DDNS_RECORD` / `RR`: record name (default `@`)
// - `DDNS_ACCESS_KEY_ID` / `AccessKeyId`
// - `DDNS_ACCESS_KEY_SECRET` / `AccessKeySecret`
// - `DDNS_ENDPOINT` / `Endpoint`: API endpoint (default `https://alidns.aliyuncs.com/`)
// - `DDNS_INTERVAL_MINUTES` / `Interval`: minutes between cycles (default 10)
// - `DDNS_IP_SOURCE` / `IpSource`: `ipcn` (default) or `sohu`
// - `DDNS_IP_SOURCE_URL` / `IpSourceUrl`: override the IP service URL
// - `DDNS_HTTP_TIMEOUT_SECS` / `Timeout`: per-request timeout (default 10)
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DDNS_DOMAIN=example.com
// export DDNS_RECORD=home
// export DDNS_ACCESS_KEY_ID=your_key_id
// export DDNS_ACCESS_KEY_SECRET=your_key_secret
//
// ddnsd
// ```

mod settings;

use anyhow::Result;
use ddns_core::{DdnsConfig, DdnsEngine, Scheduler};
use ddns_ip_http::HttpIpSource;
use ddns_provider_alidns::AliDnsProvider;
use settings::Settings;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, error, info, warn};
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
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = settings.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&settings.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = settings.ddns;

    info!("Starting ddnsd daemon");
    info!(
        "Managing {}.{} (IP source: {}, every {} minute(s))",
        config.record_name,
        config.domain,
        config.ip_source.name(),
        config.interval_minutes
    );
    if config.dry_run {
        warn!("Dry-run mode: records are read but never changed");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
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

fn log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build the engine, run the scheduler until a shutdown signal arrives
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let ip_source = HttpIpSource::new(
        config.ip_source,
        config.ip_source_url.clone(),
        config.http_timeout(),
    );
    info!("IP source URL: {}", ip_source.url());

    let provider = AliDnsProvider::new(&config)?;
    let engine = DdnsEngine::new(Box::new(ip_source), Box::new(provider), &config)?;
    let scheduler = Scheduler::new(engine, config.poll_interval())?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let runner = tokio::spawn(async move { scheduler.run_with_shutdown(shutdown_rx).await });

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);

    // The receiver is gone only if the scheduler already stopped
    let _ = shutdown_tx.send(());
    runner
        .await
        .map_err(|e| anyhow::anyhow!("Scheduler task failed: {}", e))?;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
