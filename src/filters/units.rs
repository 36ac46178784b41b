//! Parsing of tag values that are numbers with an optional unit.
//!
//! Values are normalized per dimension: speeds to km/h, lengths to meters and weights to
//! tonnes. A plain number is taken as is.
//!
//! ```text
//!   50           -> 50
//!   30 mph       -> 48.28032
//!   1.4m         -> 1.4
//!   4'6"         -> 1.3716
//!   4 ft 7 in    -> 1.397
//!   7.5t, 3.5 st -> tonnes
//! ```

use winnow::ascii::{digit0, digit1, space0, space1};
use winnow::combinator::{alt, eof, opt, terminated};
use winnow::prelude::*;

type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

const FOOT: f64 = 0.3048;
const INCH: f64 = 0.0254;

/// Known unit suffixes and their factor to the base unit of their dimension. Longer suffixes
/// come before their prefixes (`km/h` before `km`, `mph` before `m`).
const UNITS: &[(&str, f64)] = &[
    // speed, km/h
    ("km/h", 1.0),
    ("kmh", 1.0),
    ("kph", 1.0),
    ("knots", 1.852),
    ("mph", 1.609_344),
    // length, m
    ("km", 1000.0),
    ("cm", 0.01),
    ("mm", 0.001),
    ("mi", 1609.344),
    ("m", 1.0),
    ("yd", 0.9144),
    ("ft", FOOT),
    ("in", INCH),
    // weight, t
    ("kg", 0.001),
    ("lbs", 0.000_453_592_37),
    ("lb", 0.000_453_592_37),
    ("st", 0.907_184_74),
    ("lt", 1.016_046_908_8),
    ("t", 1.0),
];

/// Parse a value like `30`, `30 mph`, `1.4 m` or `4'6"` into its normalized magnitude.
///
/// Returns `None` for anything else, e.g. `RO:urban`, `walk` or `30;50`.
pub fn parse_with_optional_unit(value: &str) -> Option<f64> {
    let mut input = value.trim();
    alt((
        terminated(feet_inches, eof),
        terminated(feet_and_inches_words, eof),
        terminated(number_with_unit, eof),
    ))
    .parse_next(&mut input)
    .ok()
}

/// `12`, `12.5`, `12.` or `.5`
fn number(input: &mut &str) -> PResult<f64> {
    alt(((digit1, opt(('.', digit0))).take(), ('.', digit1).take()))
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn unit(input: &mut &str) -> PResult<f64> {
    for (suffix, factor) in UNITS {
        if input.starts_with(suffix) {
            *input = &input[suffix.len()..];
            return Ok(*factor);
        }
    }
    Err(winnow::error::ErrMode::Backtrack(
        winnow::error::ContextError::default(),
    ))
}

/// `30`, `30mph`, `1.4 m`
fn number_with_unit(input: &mut &str) -> PResult<f64> {
    let value = number.parse_next(input)?;
    space0.parse_next(input)?;
    let factor = opt(unit).parse_next(input)?.unwrap_or(1.0);
    Ok(value * factor)
}

/// `4'6"` or `4'`
fn feet_inches(input: &mut &str) -> PResult<f64> {
    let feet = terminated(number, '\'').parse_next(input)?;
    space0.parse_next(input)?;
    let inches = opt(terminated(number, '"')).parse_next(input)?.unwrap_or(0.0);
    Ok(feet * FOOT + inches * INCH)
}

/// `4 ft 7 in`
fn feet_and_inches_words(input: &mut &str) -> PResult<f64> {
    let feet = terminated(number, (space0, "ft", space1)).parse_next(input)?;
    let inches = terminated(number, (space0, "in")).parse_next(input)?;
    Ok(feet * FOOT + inches * INCH)
}
