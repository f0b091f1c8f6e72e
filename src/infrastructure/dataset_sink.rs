//! Dataset sink - timestamped CSV outputs
//!
//! Flushes the accumulated run output exactly once at normal termination:
//! records and errors each go to their own file named with the run start
//! timestamp. An empty collection writes no file - absence of the file is
//! the signal. Files are UTF-8 with a BOM so spreadsheet tools keep CJK
//! text intact.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::domain::run::RunOutput;
use crate::infrastructure::manifest::{ManifestStore, RunManifest};

/// Filename prefix of records datasets.
pub const RECORDS_PREFIX: &str = "app_titles_";

/// Filename prefix of errors datasets.
pub const ERRORS_PREFIX: &str = "app_errors_";

/// BOM prepended to every dataset so spreadsheet tools pick UTF-8. Readers
/// must strip it - the `csv` crate hands it back as part of the first header.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Where the flushed datasets landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub records_path: Option<PathBuf>,
    pub errors_path: Option<PathBuf>,
}

/// Writes run output to the data directory and records it in the manifest.
pub struct DatasetSink {
    data_dir: PathBuf,
    manifest: ManifestStore,
}

impl DatasetSink {
    pub fn new(data_dir: impl Into<PathBuf>, manifest: ManifestStore) -> Self {
        Self {
            data_dir: data_dir.into(),
            manifest,
        }
    }

    /// Serialize the run output and register the produced paths.
    pub async fn flush(
        &self,
        output: &RunOutput,
        run_timestamp: &str,
        input_path: Option<&Path>,
    ) -> Result<SinkReport> {
        fs::create_dir_all(&self.data_dir)
            .await
            .context("failed to create data directory")?;

        let records_path = if output.records.is_empty() {
            info!("no records to write");
            None
        } else {
            let path = self
                .data_dir
                .join(format!("{RECORDS_PREFIX}{run_timestamp}.csv"));
            write_csv(&path, &output.records).await?;
            info!("wrote {} records to {}", output.records.len(), path.display());
            Some(path)
        };

        let errors_path = if output.errors.is_empty() {
            None
        } else {
            let path = self
                .data_dir
                .join(format!("{ERRORS_PREFIX}{run_timestamp}.csv"));
            write_csv(&path, &output.errors).await?;
            info!("wrote {} errors to {}", output.errors.len(), path.display());
            Some(path)
        };

        self.manifest
            .save(&RunManifest {
                run_timestamp: run_timestamp.to_string(),
                input_path: input_path.map(Path::to_path_buf),
                records_path: records_path.clone(),
                errors_path: errors_path.clone(),
            })
            .await?;

        Ok(SinkReport {
            records_path,
            errors_path,
        })
    }
}

async fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        for row in rows {
            writer.serialize(row).context("failed to serialize row")?;
        }
        writer.flush().context("failed to flush csv writer")?;
    }
    fs::write(path, buffer)
        .await
        .with_context(|| format!("failed to write dataset {}", path.display()))?;
    Ok(())
}
