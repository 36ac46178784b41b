//! Errors raised while setting up a [`LegalDefaultSpeeds`](super::LegalDefaultSpeeds).

use thiserror::Error;

use super::road_type::FilterSlot;
use crate::dsl::ParseError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A filter string of a road type has a syntax error.
    #[error("Invalid road type {slot} for \"{road_type}\": {source}")]
    InvalidFilter {
        road_type: String,
        slot: FilterSlot,
        #[source]
        source: ParseError,
    },

    /// Following the placeholders of a road type leads back to itself.
    #[error("A road type filter for \"{road_type}\" contains circular placeholders")]
    CircularPlaceholder { road_type: String },
}
