//! Records search use case
//!
//! Paged, case-insensitive substring search over the `title` column of the
//! most recent records dataset. The dataset resolves through the run
//! manifest when one exists, otherwise the newest `app_titles_*.csv` by
//! filename wins. A missing or unreadable dataset surfaces as a typed error
//! that carries the transport-friendly `{status: "error", message}` form.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::domain::detail::AppDetail;
use crate::infrastructure::dataset_sink::{RECORDS_PREFIX, UTF8_BOM};
use crate::infrastructure::manifest::ManifestStore;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no records dataset matching '{prefix}*.csv' under {dir}")]
    DatasetMissing { dir: PathBuf, prefix: String },

    #[error("failed to read records dataset {path}: {message}")]
    DatasetUnreadable { path: PathBuf, message: String },
}

impl SearchError {
    /// Body for transports reporting this error with a non-2xx status.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: "error",
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub status: &'static str,
    pub data: Vec<AppDetail>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Search parameters; an empty query matches everything.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: String,
    pub page: usize,
    pub per_page: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: 1,
            per_page: 10,
        }
    }
}

/// Searches the latest records dataset.
pub struct RecordsSearch {
    data_dir: PathBuf,
    manifest: ManifestStore,
}

impl RecordsSearch {
    pub fn new(data_dir: impl Into<PathBuf>, manifest: ManifestStore) -> Self {
        Self {
            data_dir: data_dir.into(),
            manifest,
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let path = self.locate().await.ok_or_else(|| SearchError::DatasetMissing {
            dir: self.data_dir.clone(),
            prefix: RECORDS_PREFIX.to_string(),
        })?;
        debug!("searching records dataset {}", path.display());

        let records = read_records(&path).await?;
        let needle = query.q.to_lowercase();
        let matches: Vec<AppDetail> = records
            .into_iter()
            .filter(|record| {
                needle.is_empty()
                    || record
                        .title
                        .as_deref()
                        .is_some_and(|title| title.to_lowercase().contains(&needle))
            })
            .collect();

        let total = matches.len();
        let page = query.page.max(1);
        let start = (page - 1).saturating_mul(query.per_page);
        let data: Vec<AppDetail> = matches
            .into_iter()
            .skip(start)
            .take(query.per_page)
            .collect();

        Ok(SearchResponse {
            status: "success",
            data,
            total,
            page,
            per_page: query.per_page,
        })
    }

    /// Manifest first, newest `app_titles_*.csv` by filename second.
    async fn locate(&self) -> Option<PathBuf> {
        if let Some(manifest) = self.manifest.load().await {
            if let Some(records) = manifest.records_path {
                if fs::try_exists(&records).await.unwrap_or(false) {
                    return Some(records);
                }
            }
        }
        latest_by_filename(&self.data_dir, RECORDS_PREFIX).await
    }
}

async fn latest_by_filename(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) && name.ends_with(".csv") {
            names.push(name);
        }
    }
    names.sort();
    names.pop().map(|name| dir.join(name))
}

async fn read_records(path: &Path) -> Result<Vec<AppDetail>, SearchError> {
    let content = fs::read(path).await.map_err(|e| SearchError::DatasetUnreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    // the sink writes a BOM; without stripping it the first header reads
    // as "\u{feff}url"
    let body = content.strip_prefix(&UTF8_BOM).unwrap_or(&content);

    let mut reader = csv::Reader::from_reader(body);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: AppDetail = row.map_err(|e| SearchError::DatasetUnreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}
