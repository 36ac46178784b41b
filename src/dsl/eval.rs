//! Evaluation of boolean expressions.

use super::ast::BooleanExpression;

/// A leaf of a [`BooleanExpression`] that can be tested against a subject of type `T`.
pub trait Matcher<T: ?Sized> {
    fn matches(&self, subject: &T) -> bool;
}

impl<M> BooleanExpression<M> {
    /// Evaluate the expression against `subject`.
    ///
    /// `resolve` is asked for the value of every placeholder that is reached; chains
    /// short-circuit, so it is not necessarily called for all of them.
    pub fn matches<T: ?Sized>(&self, subject: &T, resolve: &dyn Fn(&str) -> bool) -> bool
    where
        M: Matcher<T>,
    {
        match self {
            BooleanExpression::Leaf(item) => item.matches(subject),
            BooleanExpression::Placeholder(name) => resolve(name),
            BooleanExpression::NotPlaceholder(name) => !resolve(name),
            BooleanExpression::AllOf(children) => {
                children.iter().all(|child| child.matches(subject, resolve))
            }
            BooleanExpression::AnyOf(children) => {
                children.iter().any(|child| child.matches(subject, resolve))
            }
            BooleanExpression::Not(inner) => !inner.matches(subject, resolve),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Equals(&'static str);

    impl Matcher<str> for Equals {
        fn matches(&self, subject: &str) -> bool {
            self.0 == subject
        }
    }

    #[test]
    fn test_leaf_delegates_to_matcher() {
        let expr = BooleanExpression::Leaf(Equals("x"));
        assert!(expr.matches("x", &|_| false));
        assert!(!expr.matches("y", &|_| false));
    }

    #[test]
    fn test_empty_chains() {
        let all: BooleanExpression<Equals> = BooleanExpression::AllOf(vec![]);
        let any: BooleanExpression<Equals> = BooleanExpression::AnyOf(vec![]);
        assert!(all.matches("x", &|_| false));
        assert!(!any.matches("x", &|_| false));
    }

    #[test]
    fn test_short_circuit_skips_placeholders() {
        let asked = RefCell::new(Vec::new());
        let resolve = |name: &str| {
            asked.borrow_mut().push(name.to_string());
            true
        };
        let expr = BooleanExpression::AnyOf(vec![
            BooleanExpression::Leaf(Equals("x")),
            BooleanExpression::Placeholder("a".to_string()),
        ]);
        assert!(expr.matches("x", &resolve));
        assert!(asked.borrow().is_empty());

        assert!(expr.matches("y", &resolve));
        assert_eq!(*asked.borrow(), vec!["a".to_string()]);
    }
}
