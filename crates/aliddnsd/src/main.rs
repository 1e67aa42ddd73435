// # aliddnsd - Alibaba Cloud DDNS Daemon
//
// Thin integration layer: all record logic lives in aliddns-core.
//
// The aliddnsd daemon is responsible for:
// 1. Reading runtime settings from environment variables
// 2. Loading the INI configuration file
// 3. Building the Alidns provider and the HTTP IP source
// 4. Running the sync engine until SIGTERM/SIGINT
//
// ## Environment
//
// - `ALIDDNS_CONFIG`: Path to the INI file (default `conf/config.ini`)
// - `ALIDDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `ALIDDNS_IP_URLS`: Comma-separated IP lookup URLs, tried in order
//   (default: built-in services for the configured address family)
// - `ALIDDNS_MODE`: `dry-run` lists records but skips every write
//
// ## Example
//
// ```bash
// export ALIDDNS_CONFIG=/etc/aliddns/config.ini
// export ALIDDNS_MODE=dry-run
//
// aliddnsd
// ```

use aliddns_core::{EngineEvent, SyncConfig, SyncEngine};
use aliddns_ip_http::HttpIpSource;
use aliddns_provider_aliyun::AliyunProvider;
use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Default configuration file location, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "conf/config.ini";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Process settings taken from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
struct DaemonSettings {
    config_path: String,
    log_level: Level,
    ip_urls: Option<Vec<String>>,
    dry_run: bool,
}

impl DaemonSettings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = lookup("ALIDDNS_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let raw_level = lookup("ALIDDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_level = match raw_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "ALIDDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                raw_level
            ),
        };

        let ip_urls = match lookup("ALIDDNS_IP_URLS") {
            Some(raw) => {
                let urls: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if urls.is_empty() {
                    anyhow::bail!("ALIDDNS_IP_URLS is set but contains no URL");
                }
                if let Some(bad) = urls
                    .iter()
                    .find(|u| !u.starts_with("https://") && !u.starts_with("http://"))
                {
                    anyhow::bail!(
                        "ALIDDNS_IP_URLS entries must use HTTP or HTTPS scheme. Got: {}",
                        bad
                    );
                }
                Some(urls)
            }
            None => None,
        };

        let dry_run = lookup("ALIDDNS_MODE").unwrap_or_default().to_lowercase() == "dry-run";

        Ok(Self {
            config_path,
            log_level,
            ip_urls,
            dry_run,
        })
    }
}

fn main() -> ExitCode {
    let settings = match DaemonSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting aliddnsd daemon");

    let config = match SyncConfig::load(&settings.config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", settings.config_path, e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if !config.dns_type_is_recognized() {
        warn!(
            "domain.dnsType '{}' is not 'ipv4' or 'ipv6'; publishing A records",
            config.dns_type
        );
    }
    info!(
        "Configuration loaded: {} domain(s), {} records, every {}s",
        config.domains.len(),
        config.address_family.record_type(),
        config.poll_interval.as_secs()
    );
    for entry in &config.domains {
        info!("Managing domain: {:?}", entry);
    }
    // zone and record lookups both go to the DNS endpoint
    debug!(
        domain_endpoint = %config.domain_endpoint,
        dns_endpoint = %config.dns_endpoint,
        "Aliyun endpoints"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let engine = match build_engine(&settings, &config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(engine).await {
            error!("Daemon error: {:#}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Build the provider, the IP source and the engine from loaded settings
fn build_engine(
    settings: &DaemonSettings,
    config: &SyncConfig,
) -> Result<(SyncEngine, tokio::sync::mpsc::Receiver<EngineEvent>)> {
    if settings.dry_run {
        warn!("Aliyun provider running in DRY-RUN mode - no changes will be made");
    }
    let provider = AliyunProvider::from_config(config, settings.dry_run)
        .context("creating Aliyun provider")?;

    let ip_source = match &settings.ip_urls {
        Some(urls) => HttpIpSource::new(urls.clone(), config.address_family),
        None => HttpIpSource::with_defaults(config.address_family),
    }
    .context("creating IP source")?;
    info!("IP lookup services: {}", ip_source.urls().join(", "));

    SyncEngine::new(Box::new(ip_source), Box::new(provider), config)
        .context("creating sync engine")
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(
    (engine, mut events): (SyncEngine, tokio::sync::mpsc::Receiver<EngineEvent>),
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Engine event");
        }
    });

    let signal_task = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown handler error: {:#}", e),
        }
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;
    signal_task.abort();

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
