//! Parser for the tag filter DSL.
//!
//! Grammar (informal):
//!
//! filter      = term (("and" | "or") term)*
//! term        = brackets* (placeholder | tag) brackets*
//! brackets    = "(" | "!(" | ")"
//! placeholder = "{" NAME "}" | "!{" NAME "}"
//! tag         = "!" key | "!~" key | "~" key ("~" value)? | key (operator value)?
//! operator    = ">=" | "<=" | ">" | "<" | "!=" | "=" | "!~" | "~"
//!
//! `and` binds tighter than `or`; the builder takes care of that. Terms must be separated from
//! connectives by whitespace or a bracket.

use super::ast::BooleanExpression;
use super::builder::{BooleanExpressionBuilder, BuildError};
use super::cursor::Cursor;
use super::error::ParseError;
use crate::filters::{CompareOp, RegexOrSet, TagFilter, parse_with_optional_unit};

const OR: &str = "or";
const AND: &str = "and";
const RESERVED_WORDS: [&str; 2] = [OR, AND];

const EQUALS: &str = "=";
const NOT_EQUALS: &str = "!=";
const LIKE: &str = "~";
const NOT: &str = "!";
const NOT_LIKE: &str = "!~";
const GREATER_THAN: &str = ">";
const LESS_THAN: &str = "<";
const GREATER_OR_EQUAL_THAN: &str = ">=";
const LESS_OR_EQUAL_THAN: &str = "<=";

const PLACEHOLDER_START: &str = "{";
const NOT_PLACEHOLDER_START: &str = "!{";
const PLACEHOLDER_END: &str = "}";

const OPEN_BRACKET: &str = "(";
const NOT_OPEN_BRACKET: &str = "!(";
const CLOSE_BRACKET: &str = ")";

const QUOTATION_MARKS: [char; 2] = ['"', '\''];

// ">=" must be tried before ">", "!=" before "=" etc.
const OPERATORS: [&str; 8] = [
    GREATER_OR_EQUAL_THAN,
    LESS_OR_EQUAL_THAN,
    GREATER_THAN,
    LESS_THAN,
    NOT_EQUALS,
    EQUALS,
    NOT_LIKE,
    LIKE,
];

/// Parse a tag filter string such as `highway = residential and !{rural}` into an expression.
pub fn parse_tag_filter(input: &str) -> Result<BooleanExpression<TagFilter>, ParseError> {
    let mut parser = Parser {
        cursor: Cursor::new(input),
        open_brackets: Vec::new(),
    };
    parser.parse_tags()
}

#[derive(Clone, Copy)]
enum Bracket {
    Open,
    Close,
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    /// Char offsets of the brackets that are not closed yet
    open_brackets: Vec<usize>,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.cursor.char_position())
    }

    fn build_error(&self, error: BuildError) -> ParseError {
        self.error(error.to_string())
    }

    fn parse_tags(&mut self) -> Result<BooleanExpression<TagFilter>, ParseError> {
        let mut builder = BooleanExpressionBuilder::new();
        let mut first = true;

        loop {
            // if it has no bracket, there must be at least one whitespace
            if !self.parse_brackets_and_spaces(Bracket::Open, &mut builder)? && !first {
                return Err(self.error("Expected a whitespace or bracket before the tag"));
            }
            first = false;

            if self.cursor.next_is_and_advance(NOT_PLACEHOLDER_START) {
                let name = self.parse_placeholder()?;
                builder.add_not_placeholder(name);
            } else if self.cursor.next_is_and_advance(PLACEHOLDER_START) {
                let name = self.parse_placeholder()?;
                builder.add_placeholder(name);
            } else {
                let tag = self.parse_tag()?;
                builder.add_value(tag);
            }

            let separated = self.parse_brackets_and_spaces(Bracket::Close, &mut builder)?;

            if self.cursor.is_at_end() {
                break;
            }

            // same as with the opening bracket, only that at the end of the string it's okay
            if !separated {
                return Err(self.error("Expected a whitespace or bracket after the tag"));
            }

            let added = if self.cursor.next_is_and_advance(OR) {
                builder.add_or()
            } else if self.cursor.next_is_and_advance(AND) {
                builder.add_and()
            } else {
                return Err(self.error(format!("Expected end of string, '{AND}' or '{OR}'")));
            };
            added.map_err(|e| self.build_error(e))?;
        }

        builder
            .build()
            .map_err(|e| match (&e, self.open_brackets.last()) {
                (BuildError::MissingClosingBracket, Some(&offset)) => {
                    ParseError::new(e.to_string(), offset)
                }
                _ => self.build_error(e),
            })?
            .ok_or_else(|| self.error("Empty expression"))
    }

    /// Consumes any sequence of whitespace and brackets of the given kind. Returns whether
    /// anything was consumed.
    fn parse_brackets_and_spaces(
        &mut self,
        bracket: Bracket,
        builder: &mut BooleanExpressionBuilder<TagFilter>,
    ) -> Result<bool, ParseError> {
        let initial = self.cursor.position();
        loop {
            let loop_start = self.cursor.position();
            self.cursor.skip_whitespace();
            match bracket {
                Bracket::Open => {
                    let offset = self.cursor.char_position();
                    if self.cursor.next_is_and_advance(NOT_OPEN_BRACKET) {
                        builder.add_open_negated_bracket();
                        self.open_brackets.push(offset);
                    } else if self.cursor.next_is_and_advance(OPEN_BRACKET) {
                        builder.add_open_bracket();
                        self.open_brackets.push(offset);
                    }
                }
                Bracket::Close => {
                    if self.cursor.next_is(CLOSE_BRACKET) {
                        builder
                            .add_close_bracket()
                            .map_err(|e| self.build_error(e))?;
                        self.open_brackets.pop();
                        self.cursor.advance();
                    }
                }
            }
            if self.cursor.position() == loop_start {
                break;
            }
        }
        self.cursor.skip_whitespace();
        Ok(self.cursor.position() > initial)
    }

    fn parse_tag(&mut self) -> Result<TagFilter, ParseError> {
        if self.cursor.next_is_and_advance(NOT) {
            let like = self.cursor.next_is_and_advance(LIKE);
            self.cursor.skip_whitespace();
            if self.cursor.next_is(NOT) {
                return Err(self.error("A tag can only be negated once"));
            }
            if like {
                let key = self.parse_pattern(Self::parse_key)?;
                return Ok(TagFilter::NotHasKeyLike(key));
            }
            return Ok(TagFilter::NotHasKey(self.parse_key()?));
        }

        if self.cursor.next_is_and_advance(LIKE) {
            self.cursor.skip_whitespace();
            let key = self.parse_pattern(Self::parse_key)?;
            return match self.parse_operator_with_surrounding_spaces() {
                None => Ok(TagFilter::HasKeyLike(key)),
                Some(LIKE) => {
                    let value = self.parse_pattern(Self::parse_quotable_word)?;
                    Ok(TagFilter::HasTagLike { key, value })
                }
                Some(operator) => Err(self.error(format!(
                    "Unexpected operator '{operator}': The key prefix operator '{LIKE}' must be used together with the binary operator '{LIKE}'"
                ))),
            };
        }

        let key = self.parse_key()?;
        let Some(operator) = self.parse_operator_with_surrounding_spaces() else {
            return Ok(TagFilter::HasKey(key));
        };

        let op = match operator {
            EQUALS => {
                let value = self.parse_quotable_word()?;
                return Ok(TagFilter::HasTag { key, value });
            }
            NOT_EQUALS => {
                let value = self.parse_quotable_word()?;
                return Ok(TagFilter::NotHasTag { key, value });
            }
            LIKE => {
                let value = self.parse_pattern(Self::parse_quotable_word)?;
                return Ok(TagFilter::HasTagValueLike { key, value });
            }
            NOT_LIKE => {
                let value = self.parse_pattern(Self::parse_quotable_word)?;
                return Ok(TagFilter::NotHasTagValueLike { key, value });
            }
            GREATER_THAN => CompareOp::Gt,
            GREATER_OR_EQUAL_THAN => CompareOp::Ge,
            LESS_THAN => CompareOp::Lt,
            LESS_OR_EQUAL_THAN => CompareOp::Le,
            other => return Err(self.error(format!("Unknown operator '{other}'"))),
        };

        let start = self.cursor.char_position();
        let word = self.parse_word()?;
        let value = parse_with_optional_unit(word).ok_or_else(|| {
            ParseError::new(
                "Expected a number (e.g. 3.5) or a number with a known unit (e.g. 3.5st)",
                start,
            )
        })?;
        Ok(TagFilter::CompareTagValue { key, op, value })
    }

    /// Parses a key or value with `parse` and compiles it as a `~` pattern.
    fn parse_pattern(
        &mut self,
        parse: fn(&mut Self) -> Result<String, ParseError>,
    ) -> Result<RegexOrSet, ParseError> {
        let start = self.cursor.char_position();
        let pattern = parse(self)?;
        RegexOrSet::new(&pattern).map_err(|e| {
            ParseError::new(format!("Invalid regular expression '{pattern}': {e}"), start)
        })
    }

    fn parse_key(&mut self) -> Result<String, ParseError> {
        if let Some(reserved) = self.next_reserved_word() {
            return Err(self.error(format!(
                "A key cannot be named like the reserved word '{reserved}', surround it with quotation marks"
            )));
        }

        let length = self.find_key_length()?;
        if length == 0 {
            return Err(self.error("Missing key (dangling prefix operator)"));
        }
        Ok(strip_and_unescape_quotes(self.cursor.advance_by(length)))
    }

    fn parse_operator_with_surrounding_spaces(&mut self) -> Option<&'static str> {
        let spaces = self.cursor.skip_whitespace();
        let cursor = &mut self.cursor;
        match OPERATORS.into_iter().find(|op| cursor.next_is_and_advance(op)) {
            Some(operator) => {
                self.cursor.skip_whitespace();
                Some(operator)
            }
            None => {
                self.cursor.retreat_by(spaces);
                None
            }
        }
    }

    fn parse_placeholder(&mut self) -> Result<String, ParseError> {
        let length = self.cursor.find_next(PLACEHOLDER_END, 0);
        if self.cursor.is_at_end_after(length) {
            return Err(ParseError::new(
                "Missing closing bracket '}' for placeholder",
                self.cursor.char_position_at(length),
            ));
        }
        if length == 0 {
            // points at the opening "{"
            return Err(ParseError::new(
                "Missing placeholder name",
                self.cursor.char_position() - 1,
            ));
        }
        let name = self.cursor.advance_by(length).to_string();
        self.cursor.advance(); // consume "}"
        Ok(name)
    }

    fn parse_quotable_word(&mut self) -> Result<String, ParseError> {
        let length = match self.find_quotation_length()? {
            Some(length) => length,
            None => self.find_word_length(),
        };
        if length == 0 {
            return Err(self.error("Missing value (dangling operator)"));
        }
        Ok(strip_and_unescape_quotes(self.cursor.advance_by(length)))
    }

    fn parse_word(&mut self) -> Result<&str, ParseError> {
        let length = self.find_word_length();
        if length == 0 {
            return Err(self.error("Missing value (dangling operator)"));
        }
        Ok(self.cursor.advance_by(length))
    }

    fn next_reserved_word(&self) -> Option<&'static str> {
        let word_length = self.find_word_length();
        RESERVED_WORDS
            .into_iter()
            .find(|word| self.cursor.next_is(word) && word_length == word.len())
    }

    fn find_key_length(&self) -> Result<usize, ParseError> {
        if let Some(length) = self.find_quotation_length()? {
            return Ok(length);
        }
        let word_length = self.find_word_length();
        Ok(OPERATORS
            .iter()
            .map(|op| self.cursor.find_next(op, 0))
            .fold(word_length, usize::min))
    }

    fn find_word_length(&self) -> usize {
        self.cursor
            .find_next_whitespace()
            .min(self.cursor.find_next(CLOSE_BRACKET, 0))
    }

    /// Length of the quoted string at the cursor including both quotation marks, or `None`
    /// if the cursor is not at a quotation mark.
    fn find_quotation_length(&self) -> Result<Option<usize>, ParseError> {
        for quote in QUOTATION_MARKS {
            if !self.cursor.next_is_char(quote) {
                continue;
            }
            let quote = quote.to_string();
            let mut length = 0;
            loop {
                length = self.cursor.find_next(&quote, 1 + length);
                if self.cursor.is_at_end_after(length) {
                    return Err(self.error("Did not close quotation marks"));
                }
                // ignore escaped
                if self.cursor.byte_at(length - 1) == Some(b'\\') {
                    continue;
                }
                // +1 to include the closing quotation mark
                return Ok(Some(length + 1));
            }
        }
        Ok(None)
    }
}

fn strip_and_unescape_quotes(s: &str) -> String {
    let trimmed = if s.len() >= 2 && (s.starts_with('\'') || s.starts_with('"')) {
        &s[1..s.len() - 1]
    } else {
        s
    };
    trimmed.replace("\\'", "'").replace("\\\"", "\"")
}
