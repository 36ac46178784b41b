//! Error type for the tag filter parser.

use thiserror::Error;

/// A syntax error in a tag filter string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("At position {offset}: {message}")]
pub struct ParseError {
    /// Human readable description of the problem.
    pub message: String,
    /// 0-based character offset at which the problem was detected.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        ParseError {
            message: message.into(),
            offset,
        }
    }
}
