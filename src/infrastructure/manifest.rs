//! Run manifest registry
//!
//! Records which datasets the last completed run consumed and produced, so
//! later steps resolve files through an explicit registry instead of guessing
//! from filesystem ordering. Readers fall back to the naming convention when
//! no manifest exists yet.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

/// What one completed run read and wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Run start time, `%Y%m%d_%H%M%S`, shared with the output filenames
    pub run_timestamp: String,

    /// Input dataset the run consumed
    pub input_path: Option<PathBuf>,

    /// Records dataset, absent when the run produced no records
    pub records_path: Option<PathBuf>,

    /// Errors dataset, absent when the run produced no errors
    pub errors_path: Option<PathBuf>,
}

/// Loads and persists the manifest file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the manifest. A missing or unreadable manifest is `None`; the
    /// caller falls back to the filename convention.
    pub async fn load(&self) -> Option<RunManifest> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return None,
        };
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("ignoring malformed manifest {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub async fn save(&self, manifest: &RunManifest) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("failed to create manifest directory")?;
            }
        }
        let content =
            serde_json::to_string_pretty(manifest).context("failed to serialize manifest")?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("failed to write manifest {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_manifest_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("manifest.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("manifest.json"));

        let manifest = RunManifest {
            run_timestamp: "20250101_120000".to_string(),
            input_path: Some(dir.path().join("shopify_apps_20250101.csv")),
            records_path: Some(dir.path().join("app_titles_20250101_120000.csv")),
            errors_path: None,
        };
        store.save(&manifest).await.unwrap();

        assert_eq!(store.load().await, Some(manifest));
    }

    #[tokio::test]
    async fn malformed_manifest_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{not json").await.unwrap();
        let store = ManifestStore::new(path);
        assert!(store.load().await.is_none());
    }
}
