//! HTTP listing discovery
//!
//! Walks the storefront's browse pages, collects app handles from the card
//! grid and persists the resulting target list to the canonical input
//! location. The first page with no cards ends the walk; so does a fetch
//! failure, since later pages would fail the same way.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Local;
use scraper::Html;
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};
use url::Url;

use crate::domain::services::TargetDiscovery;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::dataset_sink::UTF8_BOM;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::parsing::ListingParser;
use crate::infrastructure::target_source::{HANDLE_COLUMN, INPUT_PREFIX};

#[derive(Serialize)]
struct HandleRow<'a> {
    app_handle: &'a str,
}

/// Discovers targets by crawling the browse listing.
pub struct HttpListingDiscovery {
    http: HttpClient,
    parser: ListingParser,
    base_url: Url,
    max_pages: u32,
    data_dir: PathBuf,
}

impl HttpListingDiscovery {
    pub fn new(http: HttpClient, parser: ListingParser, config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid base url '{}'", config.base_url))?;
        Ok(Self {
            http,
            parser,
            base_url,
            max_pages: config.discovery.max_pages,
            data_dir: config.data_dir.clone(),
        })
    }

    async fn collect_targets(&self) -> Result<Vec<String>> {
        let mut targets = Vec::new();

        for page in 1..=self.max_pages {
            let page_url = format!(
                "{}/browse?page={}",
                self.base_url.as_str().trim_end_matches('/'),
                page
            );
            info!("crawling listing page {}", page);

            let body = match self.http.fetch_body(&page_url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("listing page {} failed, stopping discovery: {}", page, e);
                    break;
                }
            };

            let handles = self.parser.app_handles(&Html::parse_document(&body));
            if handles.is_empty() {
                info!("listing page {} has no app cards, stopping", page);
                break;
            }

            for handle in handles {
                let target = self
                    .base_url
                    .join(&handle)
                    .with_context(|| format!("cannot join app handle '{handle}'"))?;
                targets.push(target.to_string());
            }
        }

        Ok(targets)
    }

    async fn persist(&self, targets: &[String]) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.data_dir.join(format!("{INPUT_PREFIX}{timestamp}.csv"));

        fs::create_dir_all(&self.data_dir)
            .await
            .context("failed to create data directory")?;

        let mut buffer = UTF8_BOM.to_vec();
        {
            let mut writer = csv::Writer::from_writer(&mut buffer);
            for target in targets {
                writer
                    .serialize(HandleRow { app_handle: target })
                    .with_context(|| format!("failed to serialize '{HANDLE_COLUMN}' row"))?;
            }
            writer.flush().context("failed to flush csv writer")?;
        }
        fs::write(&path, buffer)
            .await
            .with_context(|| format!("failed to write target list {}", path.display()))?;

        Ok(path)
    }
}

#[async_trait]
impl TargetDiscovery for HttpListingDiscovery {
    async fn discover(&self) -> Result<PathBuf> {
        let targets = self.collect_targets().await?;
        if targets.is_empty() {
            bail!("listing discovery found no apps");
        }

        let path = self.persist(&targets).await?;
        info!(
            "discovered {} targets, saved to {}",
            targets.len(),
            path.display()
        );
        Ok(path)
    }
}
