//! A parsed tag filter ready for evaluation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::ast::BooleanExpression;
use super::error::ParseError;
use super::parser::parse_tag_filter;
use crate::Tags;
use crate::filters::{RelevantKey, TagFilter};

/// A tag filter string compiled into an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TagFilterExpression {
    expression: BooleanExpression<TagFilter>,
}

impl TagFilterExpression {
    pub fn new(filter: &str) -> Result<Self, ParseError> {
        Ok(TagFilterExpression {
            expression: parse_tag_filter(filter)?,
        })
    }

    /// Whether `tags` match. `resolve` supplies the value of `{placeholders}`.
    pub fn matches(&self, tags: &Tags, resolve: &dyn Fn(&str) -> bool) -> bool {
        self.expression.matches(tags, resolve)
    }

    /// Names of all placeholders used, in source order, duplicates included.
    pub fn placeholders(&self) -> Vec<&str> {
        self.expression.placeholders()
    }

    /// Descriptors of all tag keys that may affect the outcome of [`matches`](Self::matches).
    pub fn relevant_keys(&self) -> HashSet<RelevantKey> {
        self.expression
            .items()
            .into_iter()
            .map(TagFilter::relevant_key)
            .collect()
    }

    pub fn expression(&self) -> &BooleanExpression<TagFilter> {
        &self.expression
    }
}

impl FromStr for TagFilterExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagFilterExpression::new(s)
    }
}

impl fmt::Display for TagFilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::RegexOrSet;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_matches_with_placeholders() {
        let expr: TagFilterExpression = "{urban} and lit = yes".parse().unwrap();
        let t = tags(&[("lit", "yes")]);
        assert!(expr.matches(&t, &|name| name == "urban"));
        assert!(!expr.matches(&t, &|_| false));
    }

    #[test]
    fn test_placeholders() {
        let expr = TagFilterExpression::new("{a} or (!{b} and lit) or {a}").unwrap();
        assert_eq!(expr.placeholders(), vec!["a", "b", "a"]);

        let single = TagFilterExpression::new("{a}").unwrap();
        assert_eq!(single.placeholders(), vec!["a"]);

        let none = TagFilterExpression::new("lit").unwrap();
        assert!(none.placeholders().is_empty());
    }

    #[test]
    fn test_relevant_keys() {
        let expr =
            TagFilterExpression::new("highway = residential and (~maxspeed:.* or !lit) and {x}")
                .unwrap();
        let expected: HashSet<RelevantKey> = [
            RelevantKey::Exact("highway".into()),
            RelevantKey::Like(RegexOrSet::new("maxspeed:.*").unwrap()),
            RelevantKey::Exact("lit".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(expr.relevant_keys(), expected);

        let single = TagFilterExpression::new("lit").unwrap();
        assert_eq!(
            single.relevant_keys(),
            HashSet::from([RelevantKey::Exact("lit".into())])
        );
    }

    #[test]
    fn test_display_round_trip_keeps_semantics() {
        let samples = [
            "highway = residential",
            "a and b or c",
            "(a or b) and c",
            "!(a or b) and {x}",
            "'or' = 'a b' or shop = ''",
            "~n.[ms]e ~ \"(yes|no)\" and lit !~ no",
            "maxspeed > 30mph or width <= 4'6\"",
            "!shop and !~craft|amenity and name != x",
            r#""a\\'b" = x"#,
            r#"a = x=\ or "say \"hi\"""#,
        ];
        let subjects = [
            tags(&[]),
            tags(&[("highway", "residential")]),
            tags(&[("a", "1"), ("c", "1")]),
            tags(&[("b", "1"), ("c", "1")]),
            tags(&[("or", "a b")]),
            tags(&[("shop", "")]),
            tags(&[("name", "yes"), ("lit", "yes")]),
            tags(&[("maxspeed", "50")]),
            tags(&[("width", "1.3")]),
            tags(&[("name", "x")]),
            tags(&[(r"a\'b", "x")]),
            tags(&[("a'b", "x")]),
            tags(&[("a", r"x=\")]),
            tags(&[("say \"hi\"", "")]),
        ];
        for sample in samples {
            let original = TagFilterExpression::new(sample).unwrap();
            let printed = original.to_string();
            let reparsed = TagFilterExpression::new(&printed)
                .unwrap_or_else(|e| panic!("{printed:?} does not parse: {e}"));
            for subject in &subjects {
                for placeholder in [true, false] {
                    assert_eq!(
                        original.matches(subject, &|_| placeholder),
                        reparsed.matches(subject, &|_| placeholder),
                        "{sample:?} vs {printed:?} on {subject:?}"
                    );
                }
            }
        }
    }
}
