//! Tag filter DSL used to describe road types.
//!
//! Syntax:
//!   shop                    - has a tag with key `shop`
//!   !shop                   - doesn't have a tag with key `shop`
//!   shop = car              - tag `shop` has the value `car`
//!   shop != car             - tag `shop` doesn't have the value `car` (or is absent)
//!   ~shop|craft             - has a tag whose key matches `shop|craft`
//!   !~shop|craft            - has no tag whose key matches `shop|craft`
//!   shop ~ car|boat         - value of `shop` matches `car|boat`
//!   shop !~ car|boat        - value of `shop` doesn't match `car|boat` (or is absent)
//!   ~shop|craft ~ car|boat  - a tag whose key matches `shop|craft` has a value matching `car|boat`
//!   width > 3.5             - numeric comparison, also `<`, `<=`, `>=`
//!   maxspeed <= 30 mph      - the same with units (`4'6"`, `ft`, `m`, `mph`, `t`, ...)
//!   {urban}, !{urban}       - placeholder, resolved by the caller
//!   a and b, a or b         - `and` binds tighter than `or`
//!   (a or b) and c          - grouping
//!   !(a or b)               - negated group
//!
//! Patterns used with `~` match the whole string. Without any regex syntax they are a set of
//! alternatives separated by `|`. Keys and values can be quoted with `'` or `"`.

mod ast;
mod builder;
mod cursor;
mod error;
mod eval;
mod expression;
mod parser;

pub use ast::BooleanExpression;
pub use builder::{BooleanExpressionBuilder, BuildError};
pub use cursor::Cursor;
pub use error::ParseError;
pub use eval::Matcher;
pub use expression::TagFilterExpression;
pub use parser::parse_tag_filter;
