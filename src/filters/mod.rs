//! Leaf predicates of the tag filter DSL.

mod regex_or_set;
mod tag_filter;
mod units;

pub use regex_or_set::RegexOrSet;
pub use tag_filter::{CompareOp, RelevantKey, TagFilter};
pub use units::parse_with_optional_unit;
