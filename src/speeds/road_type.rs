//! Input and output types of the speed limit lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Tags;

/// One entry of a country's list of road types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoadType {
    /// `None` for the country's default (fallback) rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tags a road of this type implicitly has, e.g. `maxspeed=50`
    #[serde(default)]
    pub tags: Tags,
}

impl RoadType {
    pub fn new(name: Option<&str>, tags: Tags) -> Self {
        RoadType {
            name: name.map(str::to_string),
            tags,
        }
    }
}

/// Filters in the tag filter DSL that identify a road type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadTypeFilter {
    /// Matches the tags of the road exactly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Matches roads that are likely of this type
    #[serde(default, alias = "fuzzy_filter", skip_serializing_if = "Option::is_none")]
    pub fuzzy_filter: Option<String>,
    /// Matches the tags of any relation the road is a member of
    #[serde(default, alias = "relation_filter", skip_serializing_if = "Option::is_none")]
    pub relation_filter: Option<String>,
}

/// The filter slots of a [`RoadTypeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSlot {
    Filter,
    FuzzyFilter,
    RelationFilter,
}

impl fmt::Display for FilterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSlot::Filter => write!(f, "filter"),
            FilterSlot::FuzzyFilter => write!(f, "fuzzyFilter"),
            FilterSlot::RelationFilter => write!(f, "relationFilter"),
        }
    }
}

/// How sure a [`SpeedLimits`] result is. Ordered from most to least certain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Certitude {
    /// The filter of the road type matched.
    Exact,
    /// The road type was inferred from the `maxspeed` given in the input.
    FromMaxSpeed,
    /// The fuzzy filter of the road type matched.
    Fuzzy,
    /// Nothing matched, this is the country's default rule.
    Fallback,
}

/// Result of [`LegalDefaultSpeeds::speed_limits`](super::LegalDefaultSpeeds::speed_limits).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedLimits {
    /// The road type name or `None` for the default rule
    pub road_type_name: Option<String>,
    /// Tags to add to the input tags. Never contains a key that was in the input.
    pub tags: Tags,
    pub certitude: Certitude,
}
