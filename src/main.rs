//! CLI entry point for testprep.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use testprep::resolver::configure_resolver_http_timeouts;
use testprep::{
    CommandExtractor, HttpClient, Orchestrator, build_default_resolver_registry,
    default_descriptors,
};
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{RunSettings, load_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref())?;
    match (&loaded.path, &loaded.config) {
        (Some(path), Some(_)) => debug!(path = %path.display(), "Loaded config file"),
        (Some(path), None) => debug!(path = %path.display(), "No config file found"),
        (None, _) => debug!("No config path available"),
    }

    let mut settings = RunSettings::merge(&args, loaded.config.as_ref());
    settings.endpoints.github_token = env::var("GITHUB_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
    debug!(
        download_timeouts = ?settings.download_timeouts,
        resolver_timeouts = ?settings.resolver_timeouts,
        "Effective timeouts"
    );

    info!(
        work_dir = %settings.work_dir.display(),
        download_browsers = settings.download_browsers,
        "testprep starting"
    );

    let (resolver_connect, resolver_request) = settings.resolver_timeouts;
    configure_resolver_http_timeouts(resolver_connect, resolver_request);
    let registry = build_default_resolver_registry(&settings.endpoints)
        .context("Failed to build resolvers")?;

    let (download_connect, download_read) = settings.download_timeouts;
    let client = HttpClient::new_with_timeouts(download_connect, download_read)
        .context("Failed to build download client")?;

    let descriptors = default_descriptors().context("Built-in artifact catalog is invalid")?;

    std::fs::create_dir_all(&settings.work_dir).with_context(|| {
        format!(
            "Failed to create working directory '{}'",
            settings.work_dir.display()
        )
    })?;

    let orchestrator = Orchestrator::new(
        registry,
        client,
        Arc::new(CommandExtractor::new()),
        settings.work_dir.clone(),
    )
    .with_download_browsers(settings.download_browsers);

    if args.dry_run {
        let plan = orchestrator
            .plan(&descriptors)
            .await
            .context("Could not plan the run")?;
        for label in &plan.skipped {
            println!("skip      {label}");
        }
        for artifact in &plan.artifacts {
            let digest = artifact
                .digest
                .as_ref()
                .map_or_else(|| "unverified".to_string(), ToString::to_string);
            println!("fetch     {} <- {} [{digest}]", artifact.target_name, artifact.url);
        }
        return Ok(());
    }

    let report = orchestrator
        .run(&descriptors)
        .await
        .context("Test environment setup failed")?;

    for artifact in &report.artifacts {
        info!(artifact = %artifact.label, status = %artifact.status, "Result");
    }
    info!(
        work_dir = %orchestrator.work_dir().display(),
        downloaded = report.downloaded_count(),
        already_present = report.already_present_count(),
        skipped = report.skipped_count(),
        total = report.artifacts.len(),
        "Test environment ready"
    );

    Ok(())
}
