//! Patterns used by the `~` operators.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Characters that make a pattern a regular expression. `|` alone is handled as a set.
const REGEX_CHARS: &[char] = &[
    '.', '[', ']', '{', '}', '(', ')', '<', '>', '*', '+', '-', '=', '!', '?', '^', '$',
];

/// A pattern that is matched against a whole string.
///
/// Plain alternatives such as `bakery|pharmacy|clock` become a set lookup; anything containing
/// regex syntax is compiled as an anchored regular expression.
#[derive(Debug, Clone)]
pub enum RegexOrSet {
    Set {
        pattern: String,
        values: HashSet<String>,
    },
    Regex {
        pattern: String,
        regex: Regex,
    },
}

impl RegexOrSet {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.contains(REGEX_CHARS) {
            let regex = Regex::new(&format!("^(?:{pattern})$"))?;
            Ok(RegexOrSet::Regex {
                pattern: pattern.to_string(),
                regex,
            })
        } else {
            Ok(RegexOrSet::Set {
                pattern: pattern.to_string(),
                values: pattern.split('|').map(str::to_string).collect(),
            })
        }
    }

    /// Whether the entire `value` matches.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            RegexOrSet::Set { values, .. } => values.contains(value),
            RegexOrSet::Regex { regex, .. } => regex.is_match(value),
        }
    }

    /// The pattern as written in the filter.
    pub fn pattern(&self) -> &str {
        match self {
            RegexOrSet::Set { pattern, .. } | RegexOrSet::Regex { pattern, .. } => pattern,
        }
    }
}

impl PartialEq for RegexOrSet {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for RegexOrSet {}

impl Hash for RegexOrSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern().hash(state);
    }
}

impl fmt::Display for RegexOrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}
