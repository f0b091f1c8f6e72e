//! Service traits implemented by the infrastructure layer

use async_trait::async_trait;
use std::path::PathBuf;

/// Produces a fresh target list and persists it to the canonical input
/// location, returning the dataset path.
///
/// The target source asks this collaborator once when no input dataset
/// exists, then retries its load. Implementations own their politeness
/// behavior toward the origin.
#[async_trait]
pub trait TargetDiscovery: Send + Sync {
    async fn discover(&self) -> anyhow::Result<PathBuf>;
}
