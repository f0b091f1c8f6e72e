//! Harvest session entry point
//!
//! Loads configuration, resolves the target list (running listing discovery
//! when no input dataset exists), scrapes every detail page and flushes the
//! run into timestamped datasets.

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::info;

use storefront_harvest::application::ScrapeSession;
use storefront_harvest::infrastructure::config::ConfigManager;
use storefront_harvest::infrastructure::dataset_sink::DatasetSink;
use storefront_harvest::infrastructure::discovery::HttpListingDiscovery;
use storefront_harvest::infrastructure::http_client::HttpClient;
use storefront_harvest::infrastructure::logging::init_logging;
use storefront_harvest::infrastructure::manifest::ManifestStore;
use storefront_harvest::infrastructure::parsing::{AppDetailParser, ListingParser, ParsingConfig};
use storefront_harvest::infrastructure::target_source::CsvTargetSource;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("HARVEST_CONFIG").unwrap_or_else(|_| "harvest_config.json".to_string());
    let config = ConfigManager::new(&config_path).load_or_default().await?;
    init_logging(&config.logging)?;

    info!("starting harvest session against {}", config.base_url);

    let http = HttpClient::new(&config.scraping)?;
    let parsing = ParsingConfig::default();
    let detail_parser = Arc::new(AppDetailParser::with_config(&parsing.detail_selectors)?);
    let listing_parser = ListingParser::with_config(&parsing.listing_selectors)?;

    let manifest = ManifestStore::new(config.data_dir.join("manifest.json"));
    let discovery = HttpListingDiscovery::new(http.clone(), listing_parser, &config)?;
    let source = CsvTargetSource::new(&config.data_dir, manifest.clone());
    let (input_path, targets) = source.load_or_discover(&discovery).await?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session = ScrapeSession::new(http, detail_parser, config.scraping.clone());
    let output = session.run(&targets, &timestamp).await;

    let sink = DatasetSink::new(&config.data_dir, manifest);
    let report = sink.flush(&output, &timestamp, Some(&input_path)).await?;

    info!(
        "session finished: {} records, {} errors",
        output.records.len(),
        output.errors.len()
    );
    if let Some(path) = report.records_path {
        info!("records dataset: {}", path.display());
    }
    if let Some(path) = report.errors_path {
        info!("errors dataset: {}", path.display());
    }
    Ok(())
}
