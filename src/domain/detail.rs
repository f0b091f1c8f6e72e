//! Field taxonomy and record types for app detail pages
//!
//! Each detail page is reduced to a fixed set of semantic fields. Every field
//! is extracted by its own rule, so the outcome of one rule never leaks into
//! a sibling column.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The recognized semantic fields of one app detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Rating,
    ReviewsCount,
    MainDescription,
    DetailedDescription,
    DetailPoints,
    Category,
    ReleaseDate,
    Website,
}

impl Field {
    /// All recognized fields, in dataset column order.
    pub const ALL: [Field; 9] = [
        Field::Title,
        Field::Rating,
        Field::ReviewsCount,
        Field::MainDescription,
        Field::DetailedDescription,
        Field::DetailPoints,
        Field::Category,
        Field::ReleaseDate,
        Field::Website,
    ];

    /// Fields that must resolve to a value before a listing counts as scraped.
    /// The website link is best effort and never blocks a record.
    pub const REQUIRED: [Field; 8] = [
        Field::Title,
        Field::Rating,
        Field::ReviewsCount,
        Field::MainDescription,
        Field::DetailedDescription,
        Field::DetailPoints,
        Field::Category,
        Field::ReleaseDate,
    ];

    /// Column name used in the output datasets.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Rating => "rating",
            Field::ReviewsCount => "reviews_count",
            Field::MainDescription => "main_description",
            Field::DetailedDescription => "detailed_description",
            Field::DetailPoints => "detail_points",
            Field::Category => "category",
            Field::ReleaseDate => "release_date",
            Field::Website => "website",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one extraction rule for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldResult {
    /// The rule located the element and read a non-empty text.
    Value(String),
    /// The rule found nothing to read. Not an error by itself.
    #[default]
    Absent,
    /// The content was present but could not be interpreted.
    ExtractionError(String),
}

impl FieldResult {
    pub fn is_value(&self) -> bool {
        matches!(self, FieldResult::Value(_))
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            FieldResult::Value(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            FieldResult::Value(text) => Some(text),
            _ => None,
        }
    }

    /// Message for the errors dataset when this result blocked a record.
    /// `None` means the field resolved and has nothing to report.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            FieldResult::Value(_) => None,
            FieldResult::Absent => Some("element not found".to_string()),
            FieldResult::ExtractionError(message) => Some(message.clone()),
        }
    }
}

/// Result of running every field rule against one detail page.
///
/// Fixed shape - one slot per recognized field, never an open map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailExtraction {
    pub title: FieldResult,
    pub rating: FieldResult,
    pub reviews_count: FieldResult,
    pub main_description: FieldResult,
    pub detailed_description: FieldResult,
    pub detail_points: FieldResult,
    pub category: FieldResult,
    pub release_date: FieldResult,
    pub website: FieldResult,
}

impl DetailExtraction {
    pub fn get(&self, field: Field) -> &FieldResult {
        match field {
            Field::Title => &self.title,
            Field::Rating => &self.rating,
            Field::ReviewsCount => &self.reviews_count,
            Field::MainDescription => &self.main_description,
            Field::DetailedDescription => &self.detailed_description,
            Field::DetailPoints => &self.detail_points,
            Field::Category => &self.category,
            Field::ReleaseDate => &self.release_date,
            Field::Website => &self.website,
        }
    }

    /// Whether every required field resolved to a value.
    pub fn is_success(&self) -> bool {
        Field::REQUIRED.iter().all(|field| self.get(*field).is_value())
    }

    /// Required fields that did not resolve, with their results.
    pub fn required_failures(&self) -> Vec<(Field, &FieldResult)> {
        Field::REQUIRED
            .iter()
            .map(|field| (*field, self.get(*field)))
            .filter(|(_, result)| !result.is_value())
            .collect()
    }
}

/// One row of the records dataset.
///
/// Immutable once created; `timestamp` is the run start time shared by every
/// record of the same session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDetail {
    pub url: String,
    pub title: Option<String>,
    pub rating: Option<String>,
    pub reviews_count: Option<String>,
    pub main_description: Option<String>,
    pub detailed_description: Option<String>,
    pub detail_points: Option<String>,
    pub category: Option<String>,
    pub release_date: Option<String>,
    pub website: Option<String>,
    pub complete_information: bool,
    pub timestamp: String,
}

impl AppDetail {
    /// Record for a listing carrying the incomplete-listing banner.
    /// All data fields stay unset regardless of what else is on the page.
    pub fn incomplete_listing(url: &str, timestamp: &str) -> Self {
        Self {
            url: url.to_string(),
            title: None,
            rating: None,
            reviews_count: None,
            main_description: None,
            detailed_description: None,
            detail_points: None,
            category: None,
            release_date: None,
            website: None,
            complete_information: false,
            timestamp: timestamp.to_string(),
        }
    }

    /// Record for a fully evaluated listing. Callers only reach this once
    /// every required field resolved, so `complete_information` is true.
    pub fn from_extraction(url: &str, extraction: DetailExtraction, timestamp: &str) -> Self {
        Self {
            url: url.to_string(),
            title: extraction.title.into_value(),
            rating: extraction.rating.into_value(),
            reviews_count: extraction.reviews_count.into_value(),
            main_description: extraction.main_description.into_value(),
            detailed_description: extraction.detailed_description.into_value(),
            detail_points: extraction.detail_points.into_value(),
            category: extraction.category.into_value(),
            release_date: extraction.release_date.into_value(),
            website: extraction.website.into_value(),
            complete_information: true,
            timestamp: timestamp.to_string(),
        }
    }
}
