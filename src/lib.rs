//! Legal default speed limits for OpenStreetMap roads.
//!
//! Given a country code and the tags of a road, [`LegalDefaultSpeeds`] finds the road type the
//! road belongs to in that country and the `maxspeed` tags it implicitly has. Road types are
//! described with the tag filter language in [`dsl`].

use std::collections::HashMap;

pub mod config;
pub mod dsl;
pub mod filters;
pub mod speeds;

/// Tags of an OSM element.
pub type Tags = HashMap<String, String>;

pub use config::SpeedLimitsData;
pub use dsl::{ParseError, TagFilterExpression};
pub use speeds::{
    Certitude, ConfigurationError, LegalDefaultSpeeds, RoadType, RoadTypeFilter, SpeedLimits,
};
