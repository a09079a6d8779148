/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Running operator console with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use floorlink_adapter::{ClientConfig, FloorClient, StationContext};
use floorlink_console::tui::{self, LogBufferHandle, LogWriterFactory};
use floorlink_console::{BacklogSync, ConsoleConfig, InputCapture, StepEngine, TaskSession};

#[derive(Parser, Debug)]
#[command(name = "floorlink-console", version, about = "Warehouse floor operator console")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: PathBuf,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    #[arg(long = "dry-run")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let config = load_config(&args.config_path)?;

    if args.dry_run {
        init_stderr_tracing(&args.log_level)?;
        info!(
            server_url = %config.server_url,
            station_id = %config.station_id,
            "dry-run requested; configuration validated"
        );
        return Ok(());
    }

    let log_buffer = tui::runtime::new_log_buffer();
    let _log_guard = init_tracing(&args.log_level, log_buffer.clone())?;

    info!(
        server_url = %config.server_url,
        station_id = %config.station_id,
        operator_id = %config.operator_id,
        "starting floorlink-console"
    );

    let mut client =
        FloorClient::with_config_and_base_url(ClientConfig::default(), &config.server_url)?;
    client.set_context(StationContext {
        station_id: config.station_id.clone(),
        operator_id: config.operator_id.clone(),
        auth_token: config.auth_token.clone(),
    });
    let client = Arc::new(client);

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    let mut sync = BacklogSync::spawn(
        client.clone(),
        config.tuning.poll_interval(),
        shutdown.clone(),
    );
    let notices = sync
        .take_notices()
        .ok_or_else(|| anyhow!("sync notices already taken"))?;

    let capture = InputCapture::new(config.tuning.scan_debounce());
    let engine = StepEngine::new(capture, config.tuning.step_settle());
    let (session, session_events) = TaskSession::new(client, engine);

    let app = tui::app::AppState::new(session, sync);
    tui::run_tui(app, log_buffer, session_events, notices, shutdown.clone()).await?;

    shutdown.cancel();
    // Give the fire-and-forget status updates a moment to drain.
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!("console stopped");

    Ok(())
}

fn load_config(path: &PathBuf) -> Result<ConsoleConfig> {
    let path_str = path.to_str().context("config path must be valid utf-8")?;
    ConsoleConfig::from_file(path_str).context("load config")
}

fn init_stderr_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

/// Tracing goes to a rolling file and to the in-console Logs tab; stdout is
/// owned by the TUI.
fn init_tracing(
    log_level: &str,
    log_buffer: LogBufferHandle,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("floorlink");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "console.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(LogWriterFactory::new(log_buffer))
                .with_ansi(false)
                .without_time(),
        )
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;

    Ok(guard)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
