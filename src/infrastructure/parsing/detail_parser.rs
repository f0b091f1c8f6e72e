//! App detail page parser
//!
//! Runs one independent extraction rule per semantic field. A rule that finds
//! nothing reports `Absent`; a rule that finds text it cannot interpret
//! reports `ExtractionError`. Neither outcome stops the remaining rules, so
//! one broken selector costs a column, not the page.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::DetailSelectors;
use super::error::{ParsingError, ParsingResult};
use crate::domain::detail::{DetailExtraction, FieldResult};

/// Outcome of parsing one detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPage {
    /// The incomplete-listing banner is present; no field rule was run.
    IncompleteListing,
    /// All field rules ran against the document.
    Evaluated(DetailExtraction),
}

/// Parser for app detail pages with per-field fault isolation.
pub struct AppDetailParser {
    incomplete_banner_selectors: Vec<Selector>,
    title_selectors: Vec<Selector>,
    rating_section_selectors: Vec<Selector>,
    rating_value_selectors: Vec<Selector>,
    reviews_link_selectors: Vec<Selector>,
    main_description_selectors: Vec<Selector>,
    detailed_description_selectors: Vec<Selector>,
    detail_points_selectors: Vec<Selector>,
    category_row_selectors: Vec<Selector>,
    category_link_selectors: Vec<Selector>,
    release_date_selectors: Vec<Selector>,
    website_selectors: Vec<Selector>,
    cjk_date_pattern: Regex,
}

const CJK_DATE_PATTERN: &str = r"(\d{4})年(\d{1,2})月(\d{1,2})日";

impl AppDetailParser {
    /// Create a parser with the default selector configuration.
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&DetailSelectors::default())
    }

    /// Create a parser with a custom selector configuration.
    pub fn with_config(selectors: &DetailSelectors) -> ParsingResult<Self> {
        Ok(Self {
            incomplete_banner_selectors: compile_selectors(&selectors.incomplete_banner)?,
            title_selectors: compile_selectors(&selectors.title)?,
            rating_section_selectors: compile_selectors(&selectors.rating_section)?,
            rating_value_selectors: compile_selectors(&selectors.rating_value)?,
            reviews_link_selectors: compile_selectors(&selectors.reviews_link)?,
            main_description_selectors: compile_selectors(&selectors.main_description)?,
            detailed_description_selectors: compile_selectors(&selectors.detailed_description)?,
            detail_points_selectors: compile_selectors(&selectors.detail_points)?,
            category_row_selectors: compile_selectors(&selectors.category_row)?,
            category_link_selectors: compile_selectors(&selectors.category_link)?,
            release_date_selectors: compile_selectors(&selectors.release_date)?,
            website_selectors: compile_selectors(&selectors.website)?,
            cjk_date_pattern: Regex::new(CJK_DATE_PATTERN).map_err(|e| {
                ParsingError::InvalidPattern {
                    pattern: CJK_DATE_PATTERN.to_string(),
                    reason: e.to_string(),
                }
            })?,
        })
    }

    /// Parse one detail page.
    ///
    /// Checks the incomplete-listing banner first; a marked listing never
    /// runs the field rules. A pure function of the document - parsing the
    /// same document twice yields identical results.
    pub fn parse(&self, html: &Html) -> ParsedPage {
        if self.has_incomplete_banner(html) {
            debug!("incomplete-listing banner found, skipping field rules");
            return ParsedPage::IncompleteListing;
        }

        let (rating, reviews_count) = self.extract_rating_and_reviews(html);
        ParsedPage::Evaluated(DetailExtraction {
            title: self.extract_text(html, &self.title_selectors),
            rating,
            reviews_count,
            main_description: self.extract_text(html, &self.main_description_selectors),
            detailed_description: self.extract_text(html, &self.detailed_description_selectors),
            detail_points: self.extract_detail_points(html),
            category: self.extract_categories(html),
            release_date: self.extract_release_date(html),
            website: self.extract_website(html),
        })
    }

    fn has_incomplete_banner(&self, html: &Html) -> bool {
        self.incomplete_banner_selectors
            .iter()
            .any(|selector| html.select(selector).next().is_some())
    }

    /// First non-empty text found by the fallback selectors.
    fn extract_text(&self, html: &Html, selectors: &[Selector]) -> FieldResult {
        match first_match(html, selectors) {
            Some(element) => {
                let text = element_text(&element);
                if text.is_empty() {
                    FieldResult::Absent
                } else {
                    FieldResult::Value(text)
                }
            }
            None => FieldResult::Absent,
        }
    }

    /// The rating value and the sibling review count share one container.
    /// A missing container loses both; a missing review anchor inside a
    /// present container loses only the review count.
    fn extract_rating_and_reviews(&self, html: &Html) -> (FieldResult, FieldResult) {
        let Some(section) = first_match(html, &self.rating_section_selectors) else {
            return (FieldResult::Absent, FieldResult::Absent);
        };

        let rating = match first_match_within(&section, &self.rating_value_selectors) {
            Some(span) => {
                let text = element_text(&span);
                if text.is_empty() {
                    FieldResult::Absent
                } else {
                    FieldResult::Value(text)
                }
            }
            None => FieldResult::Absent,
        };

        let reviews_count = match first_match_within(&section, &self.reviews_link_selectors) {
            Some(link) => {
                let cleaned = element_text(&link)
                    .trim_matches(|c| c == '(' || c == ')')
                    .replace(',', "");
                if cleaned.is_empty() {
                    FieldResult::Value("0".to_string())
                } else {
                    FieldResult::Value(cleaned)
                }
            }
            None => FieldResult::Absent,
        };

        (rating, reviews_count)
    }

    /// All highlight items joined with `|`, preserving document order.
    fn extract_detail_points(&self, html: &Html) -> FieldResult {
        let items = all_matches(html, &self.detail_points_selectors);
        if items.is_empty() {
            return FieldResult::Absent;
        }
        let texts: Vec<String> = items
            .iter()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if texts.is_empty() {
            FieldResult::Absent
        } else {
            FieldResult::Value(texts.join("|"))
        }
    }

    /// Anchor texts under every category row in the document, joined with `|`.
    fn extract_categories(&self, html: &Html) -> FieldResult {
        let rows = all_matches(html, &self.category_row_selectors);
        if rows.is_empty() {
            return FieldResult::Absent;
        }
        let mut names = Vec::new();
        for row in &rows {
            for selector in &self.category_link_selectors {
                let anchors: Vec<String> = row
                    .select(selector)
                    .map(|a| element_text(&a))
                    .filter(|text| !text.is_empty())
                    .collect();
                if !anchors.is_empty() {
                    names.extend(anchors);
                    break;
                }
            }
        }
        if names.is_empty() {
            FieldResult::Absent
        } else {
            FieldResult::Value(names.join("|"))
        }
    }

    /// Launch date normalized to `YYYY-MM-DD`. Text that exists but cannot
    /// be read as a date is an extraction error, not an absence.
    fn extract_release_date(&self, html: &Html) -> FieldResult {
        let Some(element) = first_match(html, &self.release_date_selectors) else {
            return FieldResult::Absent;
        };
        let raw = element_text(&element);
        if raw.is_empty() {
            return FieldResult::Absent;
        }
        match self.normalize_release_date(&raw) {
            Some(date) => FieldResult::Value(date),
            None => {
                warn!("unrecognized release date text: {}", raw);
                FieldResult::ExtractionError(format!("unrecognized release date text '{raw}'"))
            }
        }
    }

    /// Take the text before the `·` separator, map a localized
    /// year/month/day date onto hyphens and reformat as `YYYY-MM-DD`.
    fn normalize_release_date(&self, raw: &str) -> Option<String> {
        let date_part = raw.split('·').next().unwrap_or(raw).trim();
        let candidate = match self.cjk_date_pattern.captures(date_part) {
            Some(caps) => format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]),
            None => date_part.to_string(),
        };

        NaiveDate::parse_from_str(&candidate, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&candidate, "%B %d, %Y"))
            .ok()
            .map(|date| date.format("%Y-%m-%d").to_string())
    }

    /// Best effort: an app without an outbound link is common, so any
    /// failure here collapses to absence.
    fn extract_website(&self, html: &Html) -> FieldResult {
        first_match(html, &self.website_selectors)
            .and_then(|a| a.value().attr("href"))
            .map(|href| FieldResult::Value(href.to_string()))
            .unwrap_or(FieldResult::Absent)
    }
}

/// Compile selector strings, skipping invalid ones with a warning. Fails
/// only when a non-empty group compiles to nothing.
pub(super) fn compile_selectors(selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::NoUsableSelectors {
            attempted: selector_strings.len(),
            errors: errors.join(", "),
        });
    }

    Ok(selectors)
}

/// First element matched by any of the fallback selectors.
fn first_match<'a>(html: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| html.select(selector).next())
}

fn first_match_within<'a>(
    element: &ElementRef<'a>,
    selectors: &[Selector],
) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| element.select(selector).next())
}

/// All elements matched by the first selector that matches anything.
fn all_matches<'a>(html: &'a Html, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    for selector in selectors {
        let elements: Vec<_> = html.select(selector).collect();
        if !elements.is_empty() {
            return elements;
        }
    }
    Vec::new()
}

/// Descendant text joined with single spaces.
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
