//! Infrastructure layer - HTTP, parsing, datasets, config, logging

pub mod config;
pub mod dataset_sink;
pub mod discovery;
pub mod http_client;
pub mod logging;
pub mod manifest;
pub mod parsing;
pub mod target_source;
