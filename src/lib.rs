//! Storefront app-listing harvester.
//!
//! Discovers candidate app detail URLs, fetches each detail page with a
//! politeness delay and bounded retries, extracts a fixed set of semantic
//! fields with per-field fault isolation, and serializes the run into
//! timestamped CSV datasets plus an error dataset.

pub mod application;
pub mod domain;
pub mod infrastructure;
