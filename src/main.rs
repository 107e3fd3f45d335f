//! Property Inventory - multi-tenant property inventory backend
//!
//! Serves the `/api/v1` REST API, runs the periodic cleanup of decided
//! suggestions and expired invitations, and shuts both down on Ctrl+C.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    prelude::*,
    EnvFilter, Layer, Registry,
};

use config::{LogFormat, LogTarget, LoggingConfig};
use property_inventory::{
    api, config, db, middleware, services, AppConfig, AppState,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Property Inventory {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    let workers = if config.server.workers == 0 {
        num_cpus::get()
    } else {
        config.server.workers
    };

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()
        .context("Failed to build async runtime")?
        .block_on(run(config))
}

async fn run(config: AppConfig) -> Result<()> {
    // The guard must stay alive so buffered log lines reach the file
    let _log_guard = init_logging(&config);

    info!("Property Inventory starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let shutdown = CancellationToken::new();

    let cleanup = if config.cleanup.enabled {
        info!(
            "Starting cleanup scheduler (every {}s)",
            config.cleanup.interval_secs
        );
        Some(services::start_cleanup_scheduler(
            db.clone(),
            config.cleanup.clone(),
            shutdown.clone(),
        ))
    } else {
        info!("Cleanup scheduler is disabled");
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    let mailer = services::build_mailer(&config.mail).context("Invalid mail configuration")?;
    let state = AppState::new(config, db, mailer);
    if state.rate_limit.is_enabled() {
        middleware::spawn_rate_limit_cleanup(state.rate_limit.clone(), shutdown.clone());
    }

    let app = api::create_router(state);

    info!("Starting HTTP server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("HTTP server error")?;

    shutdown.cancel();
    if let Some(handle) = cleanup {
        if let Err(e) = handle.await {
            tracing::warn!("Cleanup scheduler did not stop cleanly: {}", e);
        }
    }

    info!("Property Inventory stopped");
    Ok(())
}

/// Resolves on Ctrl+C and cancels background tasks
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing from the logging section of the configuration
///
/// Returns the appender guard when a file target is active.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let log_config = &config.logging;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_config.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(log_config.target, LogTarget::Console | LogTarget::Both) {
        layers.push(fmt_layer(&log_config.format, std::io::stdout));
    }
    if matches!(log_config.target, LogTarget::File | LogTarget::Both) {
        match create_file_writer(log_config) {
            Ok((writer, file_guard)) => {
                layers.push(fmt_layer(&log_config.format, writer));
                guard = Some(file_guard);
            }
            Err(e) => {
                eprintln!("Warning: file logging disabled: {:#}", e);
                layers.push(fmt_layer(&log_config.format, std::io::stdout));
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    guard
}

fn fmt_layer<W>(format: &LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(writer)
            .boxed(),
    }
}

/// Non-blocking file writer, rotated daily when configured
fn create_file_writer(log_config: &LoggingConfig) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(&log_config.log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_config.log_dir))?;

    let rotation = if log_config.daily_rotation {
        Rotation::DAILY
    } else {
        Rotation::NEVER
    };
    let file_appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&log_config.log_prefix)
        .max_log_files(log_config.max_log_files.max(1))
        .build(&log_config.log_dir)
        .context("Failed to create log file appender")?;

    Ok(tracing_appender::non_blocking(file_appender))
}

/// Ensure the data directory exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(path) = database_file(&config.database.url) {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
                info!("Created data directory: {:?}", parent);
            }
        }
    }
    Ok(())
}

/// File path of a `sqlite://` URL without its query parameters
fn database_file(url: &str) -> Option<&str> {
    let path = url.strip_prefix("sqlite://")?;
    Some(path.split('?').next().unwrap_or(path))
}

/// Print help message
fn print_help() {
    println!(
        r#"Property Inventory {}

USAGE:
    property-inventory [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information

ENVIRONMENT:
    PROPERTY_INVENTORY_CONFIG      Path to configuration file (default: config.yaml)
    PROPERTY_INVENTORY_HOST        Bind address
    PROPERTY_INVENTORY_PORT        Listen port
    PROPERTY_INVENTORY_LOG_FORMAT  pretty | compact | json
    DATABASE_URL                   SQLite connection URL
    JWT_SECRET                     Token signing secret (at least 32 characters)
    SMTP_HOST                      SMTP relay; mail is only logged when unset
    SMTP_PORT                      SMTP port (default: 587)
    SMTP_USERNAME / SMTP_PASSWORD  SMTP credentials
    MAIL_FROM                      Sender mailbox for outgoing mail
    APP_URL                        Client base URL used for links in mail

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by PROPERTY_INVENTORY_CONFIG
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/property-inventory/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
