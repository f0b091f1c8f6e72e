//! Target source - the input dataset of detail page URLs
//!
//! Reads the `app_handle` column of the newest input dataset, preserving row
//! order. Resolution goes through the run manifest first; without one the
//! newest file by modification time wins. When no input exists at all the
//! caller may run a discovery collaborator once and retry.

use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::domain::services::TargetDiscovery;
use crate::infrastructure::manifest::ManifestStore;

/// Filename prefix of input datasets produced by listing discovery.
pub const INPUT_PREFIX: &str = "shopify_apps_";

/// Column holding the absolute detail page URL.
pub const HANDLE_COLUMN: &str = "app_handle";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("no input dataset matching '{prefix}*.csv' under {dir}")]
    NotFound { dir: PathBuf, prefix: String },

    #[error("failed to read input dataset {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("input dataset {path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
}

/// CSV-backed target source.
pub struct CsvTargetSource {
    data_dir: PathBuf,
    manifest: ManifestStore,
}

impl CsvTargetSource {
    pub fn new(data_dir: impl Into<PathBuf>, manifest: ManifestStore) -> Self {
        Self {
            data_dir: data_dir.into(),
            manifest,
        }
    }

    /// Load the target list, running the discovery collaborator once if no
    /// input dataset exists yet. Returns the dataset path alongside the
    /// targets so the run can record what it consumed.
    pub async fn load_or_discover(
        &self,
        discovery: &dyn TargetDiscovery,
    ) -> anyhow::Result<(PathBuf, Vec<String>)> {
        match self.load().await {
            Ok(loaded) => Ok(loaded),
            Err(SourceError::NotFound { .. }) => {
                info!("no input dataset found, running listing discovery");
                let path = discovery.discover().await?;
                info!("discovery produced {}", path.display());
                Ok(self.load().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load the target list from the newest input dataset.
    pub async fn load(&self) -> Result<(PathBuf, Vec<String>), SourceError> {
        let path = self.locate().await.ok_or_else(|| SourceError::NotFound {
            dir: self.data_dir.clone(),
            prefix: INPUT_PREFIX.to_string(),
        })?;
        let targets = read_handle_column(&path).await?;
        info!("loaded {} targets from {}", targets.len(), path.display());
        Ok((path, targets))
    }

    /// Manifest first, newest-by-mtime among the naming convention second.
    async fn locate(&self) -> Option<PathBuf> {
        if let Some(manifest) = self.manifest.load().await {
            if let Some(input) = manifest.input_path {
                if fs::try_exists(&input).await.unwrap_or(false) {
                    debug!("input dataset resolved via manifest: {}", input.display());
                    return Some(input);
                }
            }
        }
        latest_by_mtime(&self.data_dir, INPUT_PREFIX).await
    }
}

/// Newest `{prefix}*.csv` in `dir` by modification time.
async fn latest_by_mtime(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(prefix) || !name.ends_with(".csv") {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, entry.path())),
        }
    }

    newest.map(|(_, path)| path)
}

async fn read_handle_column(path: &Path) -> Result<Vec<String>, SourceError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| SourceError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    // discovery writes its target list with a BOM; strip it or the first
    // header reads as "\u{feff}app_handle" and the column lookup misses
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().map_err(|e| SourceError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let column = headers
        .iter()
        .position(|h| h == HANDLE_COLUMN)
        .ok_or_else(|| SourceError::MissingColumn {
            path: path.to_path_buf(),
            column: HANDLE_COLUMN.to_string(),
        })?;

    let mut targets = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| SourceError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(value) = row.get(column) {
            let value = value.trim();
            if !value.is_empty() {
                targets.push(value.to_string());
            }
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::manifest::RunManifest;
    use async_trait::async_trait;
    use std::time::Duration;

    fn store(dir: &Path) -> ManifestStore {
        ManifestStore::new(dir.join("manifest.json"))
    }

    /// Input dataset the way discovery writes it: BOM first.
    async fn write_input(path: &Path, urls: &[&str]) {
        let mut content = String::from("\u{feff}app_handle\n");
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn loads_the_handle_column_in_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopify_apps_20250101.csv");
        write_input(
            &path,
            &[
                "https://apps.shopify.com/a",
                "https://apps.shopify.com/b",
                "https://apps.shopify.com/a",
            ],
        )
        .await;

        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        let (loaded_path, targets) = source.load().await.unwrap();
        assert_eq!(loaded_path, path);
        // duplicates stay - each row is processed independently
        assert_eq!(
            targets,
            vec![
                "https://apps.shopify.com/a",
                "https://apps.shopify.com/b",
                "https://apps.shopify.com/a",
            ]
        );
    }

    #[tokio::test]
    async fn input_without_a_bom_also_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopify_apps_plain.csv");
        fs::write(&path, "app_handle\nhttps://apps.shopify.com/plain\n")
            .await
            .unwrap();

        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        let (_, targets) = source.load().await.unwrap();
        assert_eq!(targets, vec!["https://apps.shopify.com/plain"]);
    }

    #[tokio::test]
    async fn missing_input_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        assert!(matches!(
            source.load().await,
            Err(SourceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopify_apps_x.csv");
        fs::write(&path, "other_column\nvalue\n").await.unwrap();

        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        assert!(matches!(
            source.load().await,
            Err(SourceError::MissingColumn { .. })
        ));
    }

    #[tokio::test]
    async fn newest_file_by_mtime_wins() {
        let dir = tempfile::tempdir().unwrap();
        let old_path = dir.path().join("shopify_apps_old.csv");
        let new_path = dir.path().join("shopify_apps_new.csv");
        write_input(&old_path, &["https://apps.shopify.com/old"]).await;
        write_input(&new_path, &["https://apps.shopify.com/new"]).await;

        let file = std::fs::File::options().write(true).open(&old_path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        let (path, targets) = source.load().await.unwrap();
        assert_eq!(path, new_path);
        assert_eq!(targets, vec!["https://apps.shopify.com/new"]);
    }

    #[tokio::test]
    async fn manifest_input_takes_precedence_over_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_input = dir.path().join("shopify_apps_manifest.csv");
        let other = dir.path().join("shopify_apps_other.csv");
        write_input(&manifest_input, &["https://apps.shopify.com/pinned"]).await;
        write_input(&other, &["https://apps.shopify.com/other"]).await;

        let manifest = store(dir.path());
        manifest
            .save(&RunManifest {
                run_timestamp: "20250101_120000".to_string(),
                input_path: Some(manifest_input.clone()),
                records_path: None,
                errors_path: None,
            })
            .await
            .unwrap();

        let source = CsvTargetSource::new(dir.path(), manifest);
        let (path, targets) = source.load().await.unwrap();
        assert_eq!(path, manifest_input);
        assert_eq!(targets, vec!["https://apps.shopify.com/pinned"]);
    }

    struct FileWritingDiscovery {
        path: PathBuf,
    }

    #[async_trait]
    impl TargetDiscovery for FileWritingDiscovery {
        async fn discover(&self) -> anyhow::Result<PathBuf> {
            write_input(&self.path, &["https://apps.shopify.com/discovered"]).await;
            Ok(self.path.clone())
        }
    }

    #[tokio::test]
    async fn discovery_runs_once_when_input_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let discovery = FileWritingDiscovery {
            path: dir.path().join("shopify_apps_fresh.csv"),
        };

        let source = CsvTargetSource::new(dir.path(), store(dir.path()));
        let (_, targets) = source.load_or_discover(&discovery).await.unwrap();
        assert_eq!(targets, vec!["https://apps.shopify.com/discovered"]);
    }
}
