//! Browse listing page parser
//!
//! Pulls app handles out of the card grid on a browse page. Handles are
//! joined onto the storefront origin by the discovery step; this parser only
//! reads the attribute values.

use scraper::{Html, Selector};
use tracing::debug;

use super::config::ListingSelectors;
use super::detail_parser::compile_selectors;
use super::error::ParsingResult;

/// Parser for app card grids on browse pages.
pub struct ListingParser {
    card_selectors: Vec<Selector>,
    handle_attribute: String,
}

impl ListingParser {
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ListingSelectors::default())
    }

    pub fn with_config(selectors: &ListingSelectors) -> ParsingResult<Self> {
        Ok(Self {
            card_selectors: compile_selectors(&selectors.app_card)?,
            handle_attribute: selectors.handle_attribute.clone(),
        })
    }

    /// App handles on one browse page, in document order. An empty result
    /// means the page has no cards - the signal to stop paging.
    pub fn app_handles(&self, html: &Html) -> Vec<String> {
        for selector in &self.card_selectors {
            let handles: Vec<String> = html
                .select(selector)
                .filter_map(|card| card.value().attr(&self.handle_attribute))
                .map(str::to_string)
                .collect();
            if !handles.is_empty() {
                debug!("found {} app cards", handles.len());
                return handles;
            }
        }
        Vec::new()
    }
}
