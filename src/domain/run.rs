//! Run-level accumulation types
//!
//! A target contributes at most one record and zero or more error entries to
//! a run. Both collections are append-only and owned by the session; workers
//! hand their contribution over as a `TargetReport`.

use serde::{Deserialize, Serialize};

use super::detail::{AppDetail, DetailExtraction};

/// One row of the errors dataset: a field- or request-level failure observed
/// on the terminal retry attempt for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub url: String,
    pub field: String,
    pub error_message: String,
}

impl ErrorEntry {
    /// Entry for a request that exhausted its retries. `field` carries the
    /// request-level label (`http_request` or `request`), not a column name.
    pub fn request_failure(url: &str, field: &str, message: String) -> Self {
        Self {
            url: url.to_string(),
            field: field.to_string(),
            error_message: message,
        }
    }

    /// Entries for every required field that stayed unresolved on the
    /// terminal attempt. The website field never appears here.
    pub fn field_failures(url: &str, extraction: &DetailExtraction) -> Vec<Self> {
        extraction
            .required_failures()
            .into_iter()
            .filter_map(|(field, result)| {
                result.failure_message().map(|message| Self {
                    url: url.to_string(),
                    field: field.as_str().to_string(),
                    error_message: message,
                })
            })
            .collect()
    }
}

/// What one target contributed to the run.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetReport {
    pub record: Option<AppDetail>,
    pub errors: Vec<ErrorEntry>,
}

impl TargetReport {
    pub fn success(record: AppDetail) -> Self {
        Self {
            record: Some(record),
            errors: Vec::new(),
        }
    }

    pub fn failures(errors: Vec<ErrorEntry>) -> Self {
        Self {
            record: None,
            errors,
        }
    }
}

/// Accumulated output of one session, flushed to the dataset sink exactly
/// once at normal termination. Row order carries no meaning.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunOutput {
    pub records: Vec<AppDetail>,
    pub errors: Vec<ErrorEntry>,
}

impl RunOutput {
    pub fn absorb(&mut self, report: TargetReport) {
        if let Some(record) = report.record {
            self.records.push(record);
        }
        self.errors.extend(report.errors);
    }
}
