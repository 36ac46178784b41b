//! Derivation of the tags a road gains from its road type.

use crate::Tags;
use crate::filters::parse_with_optional_unit;

const MAXSPEED: &str = "maxspeed";
const CONDITIONAL: &str = ":conditional";

/// Merges `input` over the tags of the road type, drops speeds that are made redundant by a
/// lower limit and removes everything the caller already supplied.
pub(crate) fn create_result_tags(input: &Tags, road_type_tags: &Tags) -> Tags {
    let mut result = road_type_tags.clone();
    for (key, value) in input {
        if !is_implicit_max_speed(key, value) {
            result.insert(key.clone(), value.clone());
        }
    }

    let cap = result.get(MAXSPEED).and_then(|v| parse_with_optional_unit(v));
    limit_speeds_to(&mut result, MAXSPEED, cap);

    result.retain(|key, _| !input.contains_key(key));
    result
}

/// A `maxspeed` like `RO:urban` refers to a legal default and is not a limit itself.
fn is_implicit_max_speed(key: &str, value: &str) -> bool {
    key == MAXSPEED && parse_with_optional_unit(value).is_none()
}

/// Removes every `<key>:*` speed that is not lower than `cap`, then repeats that for each
/// remaining subkey with its own value as the tighter cap.
pub(crate) fn limit_speeds_to(tags: &mut Tags, key: &str, cap: Option<f64>) {
    let prefix = format!("{key}:");

    if let Some(cap) = cap {
        tags.retain(|subkey, value| {
            if !subkey.starts_with(&prefix) {
                return true;
            }
            if subkey.contains(CONDITIONAL) {
                match cap_conditional(value, cap) {
                    Some(capped) => *value = capped,
                    None => return false,
                }
            }
            !parse_with_optional_unit(value).is_some_and(|speed| speed >= cap)
        });
    }

    let mut subkeys: Vec<String> = tags
        .keys()
        .filter(|subkey| subkey.starts_with(&prefix))
        .cloned()
        .collect();
    subkeys.sort();

    for subkey in subkeys {
        let Some(value) = tags.get(&subkey) else {
            continue;
        };
        let own = parse_with_optional_unit(value);
        let sub_cap = match (cap, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        limit_speeds_to(tags, &subkey, sub_cap);
    }
}

/// Drops the clauses of a conditional value whose speed is not below `cap`.
/// Returns `None` when no clause survives.
fn cap_conditional(value: &str, cap: f64) -> Option<String> {
    let kept: Vec<&str> = split_conditional_clauses(value)
        .into_iter()
        .filter(|clause| {
            let speed = clause.split('@').next().unwrap_or_default();
            !parse_with_optional_unit(speed.trim()).is_some_and(|speed| speed >= cap)
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}

/// Splits `80 @ (Mo-Fr); 50 @ (wet)` into its clauses. Separators inside parentheses don't count.
fn split_conditional_clauses(value: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                clauses.push(value[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(value[start..].trim());
    clauses.retain(|clause| !clause.is_empty());
    clauses
}
