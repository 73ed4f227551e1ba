//! CLI entry point for the GTFS stop summary tool.
//!
//! Provides subcommands for the full catalog-to-CSV run, for summarizing an
//! archive that is already at hand, and for inspecting the catalog package.

mod infra;
mod services;

use crate::infra::ckan::client::CkanClient;
use crate::services::catalog_api::{CatalogApi, select_archive};
use anyhow::Result;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use gtfs_stop_summary::{
    FailureCategory, SummaryError,
    config::{DEFAULT_OUTPUT_FILE, SourceConfig},
    fetch::{BasicClient, fetch_bytes},
    output::write_summaries,
    pipeline::summarize_archive,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_stop_summary")]
#[command(about = "Summarize the routes, direction and mode serving every stop of a GTFS feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// JSON file with `api_url` and `package_id`
    #[arg(short, long, env = "GTFS_SOURCE_CONFIG")]
    config: Option<String>,

    /// CKAN `package_show` endpoint
    #[arg(long, env = "GTFS_PACKAGE_API_URL")]
    api_url: Option<String>,

    /// Catalog package holding the schedule archive
    #[arg(long, env = "GTFS_PACKAGE_ID")]
    package_id: Option<String>,
}

impl SourceArgs {
    fn resolve(self) -> Result<SourceConfig> {
        SourceConfig::resolve(self.config.as_deref(), self.api_url, self.package_id)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the current archive in the catalog, download it and write the summary
    Fetch {
        #[command(flatten)]
        source: SourceArgs,

        /// CSV file to write
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Gzip compress the output
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Summarize a GTFS zip from a file or URL
    Summarize {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// CSV file to write
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Gzip compress the output
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// List the resources of the catalog package
    ListResources {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/gtfs_stop_summary.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_stop_summary.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch {
            source,
            output,
            gzip,
        } => {
            let config = source.resolve()?;
            fetch(&config, &output, gzip).await
        }
        Commands::Summarize {
            source,
            output,
            gzip,
        } => summarize(&source, &output, gzip).await,
        Commands::ListResources { source } => {
            let config = source.resolve()?;
            list_resources(&config).await
        }
    };

    if let Err(e) = &result {
        let category = e
            .downcast_ref::<SummaryError>()
            .map(SummaryError::category)
            .unwrap_or(FailureCategory::UnexpectedFailure);
        error!(%category, error = %format!("{e:#}"), "Run failed, no output written");
    }

    result
}

/// Full run: catalog lookup, download, summary, write.
#[tracing::instrument(skip_all, fields(package_id = %config.package_id))]
async fn fetch(config: &SourceConfig, output: &Path, gzip: bool) -> Result<()> {
    let catalog = catalog_client(config)?;

    let url = catalog.find_archive_url(catalog.package_id()).await?;
    let bytes = fetcher(&url).await?;

    write_summary(bytes, output, gzip)
}

/// Summarizes an archive from a local path or a direct URL.
#[tracing::instrument(skip(output, gzip))]
async fn summarize(source: &str, output: &Path, gzip: bool) -> Result<()> {
    let bytes = fetcher(source).await?;
    write_summary(bytes, output, gzip)
}

/// Logs every resource of the package and the one a fetch would pick.
#[tracing::instrument(skip_all, fields(package_id = %config.package_id))]
async fn list_resources(config: &SourceConfig) -> Result<()> {
    let catalog = catalog_client(config)?;
    let resources = catalog
        .list_resources()
        .await
        .map_err(|e| SummaryError::MetadataLookup(format!("{e:#}")))?;

    info!(total = resources.len(), "Resource list fetched");

    for resource in &resources {
        info!(
            name = %resource.name,
            format = %resource.format,
            datastore_active = resource.datastore_active,
            last_modified = ?resource.last_modified,
            url = %resource.url,
            "Resource"
        );
    }

    match select_archive(&resources) {
        Some(archive) => info!(name = %archive.name, url = %archive.url, "Feed archive"),
        None => info!("No raw ZIP resource in package"),
    }

    Ok(())
}

/// Builds the catalog client; failures count as a metadata lookup error.
fn catalog_client(config: &SourceConfig) -> Result<CkanClient, SummaryError> {
    CkanClient::new(&config.api_url, &config.package_id)
        .map_err(|e| SummaryError::MetadataLookup(format!("{e:#}")))
}

/// Loads the archive from a local file path or fetches it over HTTP.
#[tracing::instrument(skip_all, fields(source = %source))]
async fn fetcher(source: &str) -> Result<Bytes, SummaryError> {
    let bytes = if source.starts_with("http") {
        info!("Downloading data...");
        let client = BasicClient::new().map_err(|e| SummaryError::Download(e.to_string()))?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source)
            .map(Bytes::from)
            .map_err(|e| SummaryError::Download(format!("reading {source}: {e}")))?
    };
    info!(bytes = bytes.len(), "Archive loaded, processing GTFS files");
    Ok(bytes)
}

fn write_summary(bytes: Bytes, output: &Path, gzip: bool) -> Result<()> {
    let rows = summarize_archive(bytes)?;
    let written = write_summaries(output, &rows, gzip)?;
    info!(stops = written, "Success! Processed {} stops", written);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_client_keeps_package_id() {
        let config = SourceConfig {
            api_url: "https://ckan0.cf.opendata.inter.prod-toronto.ca/api/3/action/package_show"
                .to_string(),
            package_id: "ttc-routes-and-schedules".to_string(),
        };

        let catalog = catalog_client(&config).unwrap();

        assert_eq!(catalog.package_id(), "ttc-routes-and-schedules");
    }

    #[test]
    fn test_bad_catalog_url_is_metadata_lookup() {
        let config = SourceConfig {
            api_url: "not a url".to_string(),
            package_id: "ttc-routes-and-schedules".to_string(),
        };

        let err = catalog_client(&config).err().unwrap();

        assert!(matches!(err, SummaryError::MetadataLookup(_)));
        assert_eq!(err.category(), FailureCategory::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = fetcher("/definitely/not/here/gtfs.zip").await.unwrap_err();
        assert_eq!(err.category(), FailureCategory::SourceUnavailable);
    }
}
