//! Boolean expression tree shared by the filter DSL and its tests.

use std::fmt;

/// A boolean expression over leaves of type `M`.
///
/// `M` is the leaf matcher (see [`Matcher`](super::eval::Matcher)); placeholders are resolved by
/// the caller at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpression<M> {
    /// A leaf matcher, e.g. `highway=residential`
    Leaf(M),

    /// A named reference resolved at evaluation time: `{urban}`
    Placeholder(String),

    /// Negated named reference: `!{urban}`
    NotPlaceholder(String),

    /// All children must match: `a and b`
    AllOf(Vec<BooleanExpression<M>>),

    /// Any child must match: `a or b`
    AnyOf(Vec<BooleanExpression<M>>),

    /// Negated group: `!(a or b)`
    Not(Box<BooleanExpression<M>>),
}

impl<M> BooleanExpression<M> {
    /// Remove redundant depth from the tree.
    ///
    /// Chains with a single child are replaced by that child and nested chains of the same kind
    /// are spliced into their parent. `Not` always keeps its child.
    pub fn flatten(self) -> Self {
        match self {
            BooleanExpression::AllOf(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.flatten() {
                        BooleanExpression::AllOf(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                collapse(flat, BooleanExpression::AllOf)
            }
            BooleanExpression::AnyOf(children) => {
                let mut flat = Vec::with_capacity(children.len());
                for child in children {
                    match child.flatten() {
                        BooleanExpression::AnyOf(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                collapse(flat, BooleanExpression::AnyOf)
            }
            BooleanExpression::Not(inner) => BooleanExpression::Not(Box::new(inner.flatten())),
            other => other,
        }
    }

    /// Every placeholder name in the tree, negated or not, depth-first in source order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_placeholders(&mut names);
        names
    }

    fn collect_placeholders<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            BooleanExpression::Leaf(_) => {}
            BooleanExpression::Placeholder(name) | BooleanExpression::NotPlaceholder(name) => {
                names.push(name.as_str())
            }
            BooleanExpression::AllOf(children) | BooleanExpression::AnyOf(children) => {
                for child in children {
                    child.collect_placeholders(names);
                }
            }
            BooleanExpression::Not(inner) => inner.collect_placeholders(names),
        }
    }

    /// Every leaf matcher in the tree, depth-first in source order.
    pub fn items(&self) -> Vec<&M> {
        let mut items = Vec::new();
        self.collect_items(&mut items);
        items
    }

    fn collect_items<'a>(&'a self, items: &mut Vec<&'a M>) {
        match self {
            BooleanExpression::Leaf(item) => items.push(item),
            BooleanExpression::Placeholder(_) | BooleanExpression::NotPlaceholder(_) => {}
            BooleanExpression::AllOf(children) | BooleanExpression::AnyOf(children) => {
                for child in children {
                    child.collect_items(items);
                }
            }
            BooleanExpression::Not(inner) => inner.collect_items(items),
        }
    }
}

fn collapse<M>(
    mut children: Vec<BooleanExpression<M>>,
    chain: fn(Vec<BooleanExpression<M>>) -> BooleanExpression<M>,
) -> BooleanExpression<M> {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    chain(children)
}

impl<M: fmt::Display> fmt::Display for BooleanExpression<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanExpression::Leaf(item) => write!(f, "{item}"),
            BooleanExpression::Placeholder(name) => write!(f, "{{{name}}}"),
            BooleanExpression::NotPlaceholder(name) => write!(f, "!{{{name}}}"),
            BooleanExpression::AllOf(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    if matches!(child, BooleanExpression::AnyOf(_)) {
                        write!(f, "({child})")?;
                    } else {
                        write!(f, "{child}")?;
                    }
                }
                Ok(())
            }
            BooleanExpression::AnyOf(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " or ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            BooleanExpression::Not(inner) => write!(f, "!({inner})"),
        }
    }
}
