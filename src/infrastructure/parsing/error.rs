//! Parser construction errors
//!
//! Per-field extraction outcomes are not errors at this level; they are
//! `FieldResult` values. These errors only cover selector configuration
//! problems that make a parser unusable.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("no usable selectors compiled from {attempted} candidates: {errors}")]
    NoUsableSelectors { attempted: usize, errors: String },

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

pub type ParsingResult<T> = Result<T, ParsingError>;
