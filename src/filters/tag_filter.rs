//! Leaf matchers of a tag filter expression.

use std::fmt;

use super::regex_or_set::RegexOrSet;
use super::units::parse_with_optional_unit;
use crate::Tags;
use crate::dsl::Matcher;

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl CompareOp {
    pub fn compare(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

/// Which tag keys can influence the outcome of a [`TagFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelevantKey {
    Exact(String),
    Like(RegexOrSet),
}

impl RelevantKey {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            RelevantKey::Exact(k) => k == key,
            RelevantKey::Like(pattern) => pattern.matches(key),
        }
    }
}

/// A single predicate on a tag map.
#[derive(Debug, Clone, PartialEq)]
pub enum TagFilter {
    /// `shop`
    HasKey(String),

    /// `!shop`
    NotHasKey(String),

    /// `shop = car`
    HasTag { key: String, value: String },

    /// `shop != car`; also true if there is no `shop` at all
    NotHasTag { key: String, value: String },

    /// `~shop|craft`
    HasKeyLike(RegexOrSet),

    /// `!~shop|craft`
    NotHasKeyLike(RegexOrSet),

    /// `shop ~ car|boat`
    HasTagValueLike { key: String, value: RegexOrSet },

    /// `shop !~ car|boat`; also true if there is no `shop` at all
    NotHasTagValueLike { key: String, value: RegexOrSet },

    /// `~shop|craft ~ car|boat`
    HasTagLike { key: RegexOrSet, value: RegexOrSet },

    /// `width > 3.5`, `maxspeed <= 30 mph`
    CompareTagValue {
        key: String,
        op: CompareOp,
        value: f64,
    },
}

impl TagFilter {
    pub fn relevant_key(&self) -> RelevantKey {
        match self {
            TagFilter::HasKey(key)
            | TagFilter::NotHasKey(key)
            | TagFilter::HasTag { key, .. }
            | TagFilter::NotHasTag { key, .. }
            | TagFilter::HasTagValueLike { key, .. }
            | TagFilter::NotHasTagValueLike { key, .. }
            | TagFilter::CompareTagValue { key, .. } => RelevantKey::Exact(key.clone()),
            TagFilter::HasKeyLike(key)
            | TagFilter::NotHasKeyLike(key)
            | TagFilter::HasTagLike { key, .. } => RelevantKey::Like(key.clone()),
        }
    }
}

impl Matcher<Tags> for TagFilter {
    fn matches(&self, tags: &Tags) -> bool {
        match self {
            TagFilter::HasKey(key) => tags.contains_key(key),
            TagFilter::NotHasKey(key) => !tags.contains_key(key),
            TagFilter::HasTag { key, value } => tags.get(key) == Some(value),
            TagFilter::NotHasTag { key, value } => tags.get(key) != Some(value),
            TagFilter::HasKeyLike(key) => tags.keys().any(|k| key.matches(k)),
            TagFilter::NotHasKeyLike(key) => !tags.keys().any(|k| key.matches(k)),
            TagFilter::HasTagValueLike { key, value } => {
                tags.get(key).is_some_and(|v| value.matches(v))
            }
            TagFilter::NotHasTagValueLike { key, value } => {
                tags.get(key).is_none_or(|v| !value.matches(v))
            }
            TagFilter::HasTagLike { key, value } => tags
                .iter()
                .any(|(k, v)| key.matches(k) && value.matches(v)),
            TagFilter::CompareTagValue { key, op, value } => tags
                .get(key)
                .and_then(|v| parse_with_optional_unit(v))
                .is_some_and(|actual| op.compare(actual, *value)),
        }
    }
}

/// Writes a key or value so that the parser reads it back unchanged.
struct Quotable<'a>(&'a str);

impl fmt::Display for Quotable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let needs_quotes = s.is_empty()
            || s == "and"
            || s == "or"
            || s.chars()
                .any(|c| c.is_whitespace() || "()'\"{}=!~<>".contains(c));
        if !needs_quotes {
            return f.write_str(s);
        }
        // a closing quotation mark right after a trailing backslash would count as escaped
        let bare = s.ends_with('\\')
            && !s.starts_with(['"', '\''])
            && !s.chars().any(|c| c.is_whitespace() || c == ')');
        if bare {
            f.write_str(&escape(s, false))
        } else {
            write!(f, "\"{}\"", escape(s, true))
        }
    }
}

/// Undoes the unescaping of `\'` and `\"` done when a word is parsed.
fn escape(s: &str, quoted: bool) -> String {
    let mut escaped = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('"', _) if quoted => escaped.push_str("\\\""),
            ('\\', Some('\'')) => escaped.push_str("\\\\"),
            ('\\', Some('"')) if !quoted => escaped.push_str("\\\\"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagFilter::HasKey(key) => write!(f, "{}", Quotable(key)),
            TagFilter::NotHasKey(key) => write!(f, "!{}", Quotable(key)),
            TagFilter::HasTag { key, value } => {
                write!(f, "{} = {}", Quotable(key), Quotable(value))
            }
            TagFilter::NotHasTag { key, value } => {
                write!(f, "{} != {}", Quotable(key), Quotable(value))
            }
            TagFilter::HasKeyLike(key) => write!(f, "~{}", Quotable(key.pattern())),
            TagFilter::NotHasKeyLike(key) => write!(f, "!~{}", Quotable(key.pattern())),
            TagFilter::HasTagValueLike { key, value } => {
                write!(f, "{} ~ {}", Quotable(key), Quotable(value.pattern()))
            }
            TagFilter::NotHasTagValueLike { key, value } => {
                write!(f, "{} !~ {}", Quotable(key), Quotable(value.pattern()))
            }
            TagFilter::HasTagLike { key, value } => write!(
                f,
                "~{} ~ {}",
                Quotable(key.pattern()),
                Quotable(value.pattern())
            ),
            TagFilter::CompareTagValue { key, op, value } => {
                write!(f, "{} {} {}", Quotable(key), op, value)
            }
        }
    }
}
