use anyhow::{Context, Result};
use clap::{Arg, Command};
use colored::*;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing::subscriber::DefaultGuard;
use tracing::{debug, error, info};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod config;
mod fingerprint;
mod github;
mod output;

use config::{Config, ConfigError};
use github::GitHubClient;
use output::{LookupStatus, Report};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = Command::new("check-image")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check whether a fingerprinted container image version is already published to GHCR")
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help("File to append the results to (defaults to $GITHUB_OUTPUT, then stdout)"),
        )
        .get_matches();

    let _log = init_logging(config::is_debug(env::var("ACTION_DEBUG").ok()));

    let output = matches.get_one::<PathBuf>("output").cloned();

    match run(Config::from_env(), output).await? {
        Some(report) => {
            let status = match report.status {
                LookupStatus::Found => "found".green(),
                LookupStatus::None => "none".yellow(),
            };
            eprintln!("{} {} {}", "📦".blue(), report.image_version.cyan(), status);
            Ok(())
        }
        None => process::exit(1),
    }
}

/// Check the image and append the report to the output. Returns `None`
/// without writing anything when the configuration is incomplete.
async fn run(
    config: Result<Config, ConfigError>,
    output_override: Option<PathBuf>,
) -> Result<Option<Report>> {
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Ok(None);
        }
    };

    let output = output_override.or_else(|| config.output.clone());

    let report = check_image(&config).await?;
    report.write(output.as_deref()).await?;

    Ok(Some(report))
}

/// Logging lives for as long as the returned guard.
fn init_logging(debug: bool) -> DefaultGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "check_image=debug" } else { "check_image=info" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
        .set_default()
}

async fn check_image(config: &Config) -> Result<Report> {
    debug!("Owner: {}", config.owner);
    debug!("Repository: {}", config.repository);
    debug!("Image: {}", config.image_name);
    debug!("Version: {}", config.base_version);

    let version = fingerprint::image_version(&config.base_version, config.build_args.as_deref());

    if config.invalidate_cache.is_set() {
        debug!("Image is set to be rebuilt due to the invalidate option");
        return Ok(Report::new(LookupStatus::None, version));
    }

    let client = GitHubClient::with_api_url(config.token.as_deref(), &config.api_url);
    let exists = client
        .image_exists(&config.owner, &config.package_name(), &version)
        .await
        .with_context(|| format!("Failed to look up {} in the package registry", version))?;

    info!("Version: {}", version);

    let status = if exists {
        LookupStatus::Found
    } else {
        LookupStatus::None
    };
    Ok(Report::new(status, version))
}
