//! Citree command-line entry point
//!
//! Loads configuration, builds (or resumes) a citation tree, optionally
//! reprocesses the retry set, then writes the CSV and HTML exports.

mod cli;

use citree_common::metrics::{register_metrics, FETCH_BUCKETS};
use citree_common::{config::AppConfig, errors::AppError, Result, VERSION};
use citree_crawler::{export, snapshot, source, TreeBuilder};
use clap::Parser;
use cli::Cli;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info", false);
            error!(error = %e, code = e.code().as_code(), "Failed to load configuration");
            return exit_code(&e);
        }
    };

    init_tracing(&config.observability.log_level, config.observability.json_logging);
    info!("Starting Citree v{}", VERSION);

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, code = e.code().as_code(), "Citation tree build failed");
            exit_code(&e)
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    init_metrics(config)?;

    let source = source::create_source(&config.source)?;
    let mut builder = TreeBuilder::from_config(config, source)?;

    let mut tree = match &cli.resume {
        Some(path) => builder.resume(snapshot::load(path).await?).await?,
        None => builder.build(config.seed()?).await?,
    };

    if cli.reprocess_retries && !tree.retry().is_empty() {
        let resolved = builder.reprocess(&mut tree).await?;
        info!(resolved = resolved.len(), "Retry set reprocessed");
    }

    let files = export::export_all(&tree, &config.export, &config.tree)?;
    if let Some(path) = &files.csv {
        info!(path = %path.display(), "CSV written");
    }
    if let Some(path) = &files.html {
        info!(path = %path.display(), "HTML written");
    }

    if !tree.retry().is_empty() {
        warn!(
            count = tree.retry().len(),
            papers = ?tree.retry(),
            "Papers still need reprocessing"
        );
    }

    info!(
        papers = tree.papers().node_count(),
        authors = tree.authors().node_count(),
        fetched = tree.total_fetched(),
        calls = builder.calls(),
        cooldowns = builder.cooldowns(),
        max_degree = tree.max_degree(),
        "Done"
    );
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Expose Prometheus metrics when a port is configured
fn init_metrics(config: &AppConfig) -> Result<()> {
    register_metrics();

    let port = config.observability.metrics_port;
    if port == 0 {
        return Ok(());
    }

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("fetch_duration_seconds".to_string()),
            FETCH_BUCKETS,
        )
        .and_then(|builder| builder.install())
        .map_err(|e| AppError::Configuration {
            message: format!("metrics exporter: {e}"),
        })?;

    info!(port = port, "Metrics exporter listening");
    Ok(())
}

fn exit_code(err: &AppError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
