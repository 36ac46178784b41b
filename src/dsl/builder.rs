//! Incremental construction of a [`BooleanExpression`] from a stream of tokens.
//!
//! The parser feeds operands, connectives and brackets in source order; the builder takes care
//! of precedence (`and` binds tighter than `or`) so the parser doesn't have to.

use thiserror::Error;

use super::ast::BooleanExpression;

/// Token sequences the builder cannot turn into a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Closing bracket has no opening bracket")]
    UnmatchedClosingBracket,

    #[error("Missing closing bracket")]
    MissingClosingBracket,

    #[error("Missing operand")]
    MissingOperand,
}

/// One open bracket level.
struct Group<M> {
    negated: bool,
    /// Completed operands of `or`, each an `and` chain
    alternatives: Vec<BooleanExpression<M>>,
    /// Operands of the `and` chain currently being built
    terms: Vec<BooleanExpression<M>>,
}

impl<M> Group<M> {
    fn new(negated: bool) -> Self {
        Group {
            negated,
            alternatives: Vec::new(),
            terms: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.alternatives.is_empty() && self.terms.is_empty()
    }

    fn close(mut self) -> Result<BooleanExpression<M>, BuildError> {
        if self.terms.is_empty() {
            return Err(BuildError::MissingOperand);
        }
        self.alternatives.push(BooleanExpression::AllOf(self.terms));
        let expr = BooleanExpression::AnyOf(self.alternatives);
        if self.negated {
            Ok(BooleanExpression::Not(Box::new(expr)))
        } else {
            Ok(expr)
        }
    }
}

pub struct BooleanExpressionBuilder<M> {
    /// Innermost group last; the first entry is the top level and is never popped.
    groups: Vec<Group<M>>,
    /// An `and`/`or` was added and still waits for its right-hand operand
    pending_operator: bool,
}

impl<M> Default for BooleanExpressionBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> BooleanExpressionBuilder<M> {
    pub fn new() -> Self {
        BooleanExpressionBuilder {
            groups: vec![Group::new(false)],
            pending_operator: false,
        }
    }

    fn current(&mut self) -> &mut Group<M> {
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    fn push_operand(&mut self, operand: BooleanExpression<M>) {
        self.pending_operator = false;
        self.current().terms.push(operand);
    }

    pub fn add_value(&mut self, value: M) {
        self.push_operand(BooleanExpression::Leaf(value));
    }

    pub fn add_placeholder(&mut self, name: impl Into<String>) {
        self.push_operand(BooleanExpression::Placeholder(name.into()));
    }

    pub fn add_not_placeholder(&mut self, name: impl Into<String>) {
        self.push_operand(BooleanExpression::NotPlaceholder(name.into()));
    }

    pub fn add_and(&mut self) -> Result<(), BuildError> {
        if self.pending_operator || self.current().terms.is_empty() {
            return Err(BuildError::MissingOperand);
        }
        self.pending_operator = true;
        Ok(())
    }

    pub fn add_or(&mut self) -> Result<(), BuildError> {
        if self.pending_operator || self.current().terms.is_empty() {
            return Err(BuildError::MissingOperand);
        }
        let group = self.current();
        let terms = std::mem::take(&mut group.terms);
        group.alternatives.push(BooleanExpression::AllOf(terms));
        self.pending_operator = true;
        Ok(())
    }

    pub fn add_open_bracket(&mut self) {
        self.groups.push(Group::new(false));
    }

    /// Opens a bracket whose content will be negated: `!(`
    pub fn add_open_negated_bracket(&mut self) {
        self.groups.push(Group::new(true));
    }

    pub fn add_close_bracket(&mut self) -> Result<(), BuildError> {
        if self.groups.len() < 2 {
            return Err(BuildError::UnmatchedClosingBracket);
        }
        if self.pending_operator {
            return Err(BuildError::MissingOperand);
        }
        let group = self.groups.pop().ok_or(BuildError::UnmatchedClosingBracket)?;
        let expr = group.close()?;
        self.push_operand(expr);
        Ok(())
    }

    /// Finish the expression. Returns `None` if nothing was added at all.
    pub fn build(mut self) -> Result<Option<BooleanExpression<M>>, BuildError> {
        if self.groups.len() > 1 {
            return Err(BuildError::MissingClosingBracket);
        }
        if self.pending_operator {
            return Err(BuildError::MissingOperand);
        }
        let root = self.groups.pop().ok_or(BuildError::MissingOperand)?;
        if root.is_empty() {
            return Ok(None);
        }
        Ok(Some(root.close()?.flatten()))
    }
}
