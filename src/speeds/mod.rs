//! Legal default speed limits per country and road type.

mod error;
mod reduce;
mod resolver;
mod road_type;

pub use error::ConfigurationError;
pub use resolver::{LegalDefaultSpeeds, Replacer};
pub use road_type::{Certitude, FilterSlot, RoadType, RoadTypeFilter, SpeedLimits};
