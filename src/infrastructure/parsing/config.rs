//! Parsing configuration for HTML extraction
//!
//! Centralized configuration for CSS selectors. Every selector group is a
//! list of fallbacks tried in order, so a storefront markup change can be
//! absorbed by editing configuration instead of code.

use serde::{Deserialize, Serialize};

/// Main parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// App detail page selectors
    pub detail_selectors: DetailSelectors,

    /// Browse listing page selectors
    pub listing_selectors: ListingSelectors,
}

/// CSS selectors for app detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    /// Banner shown when a listing has no public detail content
    pub incomplete_banner: Vec<String>,

    /// App title heading
    pub title: Vec<String>,

    /// Container holding the rating value and the review-count link
    pub rating_section: Vec<String>,

    /// Rating value inside the rating section
    pub rating_value: Vec<String>,

    /// Review-count anchor inside the rating section
    pub reviews_link: Vec<String>,

    /// Short tagline under the title
    pub main_description: Vec<String>,

    /// Long-form description body
    pub detailed_description: Vec<String>,

    /// Highlight list items inside the description body
    pub detail_points: Vec<String>,

    /// Containers holding category links; all matches count
    pub category_row: Vec<String>,

    /// Category anchors inside a category row
    pub category_link: Vec<String>,

    /// Launch date element
    pub release_date: Vec<String>,

    /// Outbound website link
    pub website: Vec<String>,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            incomplete_banner: vec![
                "div.app-listing-incomplete".to_string(),
                "[data-incomplete-listing]".to_string(),
                "div.unpublished-app-banner".to_string(),
            ],
            title: vec![
                "h1.tw-text-heading-lg".to_string(),
                "h1".to_string(),
            ],
            rating_section: vec![
                "dd.tw-flex.tw-items-center.tw-gap-2xs.tw-text-body-sm".to_string(),
                "dd.app-rating".to_string(),
            ],
            rating_value: vec!["span".to_string()],
            reviews_link: vec![
                "a[href*='/reviews']".to_string(),
                "span a".to_string(),
            ],
            main_description: vec![
                "p.tw-text-body-md.tw-text-fg-secondary".to_string(),
                "p.app-tagline".to_string(),
            ],
            detailed_description: vec![
                "div#app-details".to_string(),
                "div.app-details".to_string(),
                "section.app-description".to_string(),
            ],
            detail_points: vec![
                "div#app-details ul li".to_string(),
                "div.app-details ul li".to_string(),
                "ul.app-highlights li".to_string(),
            ],
            category_row: vec![
                "dd.app-categories".to_string(),
                "div.app-categories".to_string(),
            ],
            category_link: vec!["a".to_string()],
            release_date: vec![
                "dd.app-launched".to_string(),
                "p.app-launched".to_string(),
                "dd.tw-text-body-sm.tw-text-fg-tertiary".to_string(),
            ],
            website: vec![
                "a.app-website".to_string(),
                "a[data-website-link]".to_string(),
            ],
        }
    }
}

/// CSS selectors for browse listing pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// App card containers carrying the handle attribute
    pub app_card: Vec<String>,

    /// Attribute on the card that names the app handle
    pub handle_attribute: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            app_card: vec!["div[data-app-card-handle-value]".to_string()],
            handle_attribute: "data-app-card-handle-value".to_string(),
        }
    }
}
