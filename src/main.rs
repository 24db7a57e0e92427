/// Version injected at compile time via CLOUD_INVENTORY_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("CLOUD_INVENTORY_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cloud_inventory::aws::client::AwsClient;
use cloud_inventory::config::Config;
use cloud_inventory::error::{ApiError, InventoryError};
use cloud_inventory::inventory::{self, HandlerResponse, ResourceKind};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Collect an inventory of one AWS resource kind across all enabled regions
#[derive(Parser, Debug)]
#[command(name = "cloud-inventory", version = VERSION, about, long_about = None)]
struct Args {
    /// Resource kind to collect
    #[arg(value_enum)]
    kind: ResourceKind,

    /// Credentials profile to use
    #[arg(short, long)]
    profile: Option<String>,

    /// Region asked for the list of enabled regions
    #[arg(short, long)]
    region: Option<String>,

    /// Send all requests to this endpoint (e.g. LocalStack)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Regions processed at once
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Give up on a region after this many seconds (0 waits forever)
    #[arg(long, value_name = "SECS")]
    region_timeout: Option<u64>,

    /// JSON file with the request event, passed through as context
    #[arg(long, value_name = "FILE")]
    event: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

/// Read the request event, `null` when none was given
fn read_event(path: Option<&Path>) -> Result<Value> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Event file {} is not valid JSON", path.display()))
}

/// Apply command line overrides on top of the config file
fn merge_args(mut config: Config, args: &Args) -> Config {
    if let Some(profile) = &args.profile {
        config.profile = Some(profile.clone());
    }
    if let Some(region) = &args.region {
        config.reference_region = region.clone();
    }
    if let Some(endpoint_url) = &args.endpoint_url {
        config.endpoint_url = Some(endpoint_url.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(secs) = args.region_timeout {
        config.region_timeout_secs = secs;
    }
    config
}

/// Response for a run that could not get as far as listing regions
fn setup_failure(err: &anyhow::Error) -> HandlerResponse {
    HandlerResponse::failure(&InventoryError::Discovery(ApiError::Other(
        anyhow::anyhow!("{:#}", err),
    )))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;
    tracing::info!("cloud-inventory {} started", VERSION);

    let config = merge_args(Config::load(), &args);
    let profile = config.effective_profile();
    let settings = config.settings();
    tracing::info!(
        "Using profile: {}, reference region: {}, concurrency: {}",
        profile,
        settings.reference_region,
        settings.concurrency
    );

    let event = read_event(args.event.as_deref())?;

    let response = match AwsClient::new(
        &profile,
        config.endpoint_url.as_deref(),
        config.request_timeout(),
    ) {
        Ok(client) => inventory::handle(&client, args.kind, &settings, &event).await,
        Err(err) => {
            tracing::error!("Client setup failed: {:#}", err);
            setup_failure(&err)
        }
    };

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", rendered);

    Ok(if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
