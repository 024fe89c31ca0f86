//! # flowstone-logic: condition trees for simulation models
//!
//! A [`Logic`] value is a boolean expression over opaque leaves: constants,
//! probes into some external state, negation, grouping, and n-ary
//! conjunction/disjunction. Trees are simplified algebraically while they
//! are being built and evaluated lazily (short-circuit, insertion order)
//! when queried.
//!
//! The leaf type `L` is generic: this crate knows nothing about what a
//! probe observes. Evaluation takes a resolver that maps a leaf to its
//! current truth value, so the same tree can be evaluated against live,
//! mutating state without the tree itself capturing that state.
//!
//! # Construction
//!
//! Trees are built with [`Logic::and`], [`Logic::or`], [`Logic::negate`]
//! and [`Logic::grouped`], or with the operator sugar `&`, `|` and `!`:
//!
//! ```
//! use flowstone_logic::Logic;
//!
//! let expr = (Logic::Eval("busy") | Logic::Eval("queued")) & !Logic::Eval("halted");
//! let truth = expr.eval(&mut |name: &&str| *name == "busy");
//! assert!(truth);
//! ```
//!
//! # Normalization
//!
//! The constructors maintain these shapes, so consumers may rely on them:
//!
//! - `Val` is folded out of `And`/`Or`/`Not` (`true & x` is `x`,
//!   `false & x` is `false`, `!true` is `false`, and the duals).
//! - Double negation cancels: `!!x` is `x`.
//! - Double grouping collapses: `((x))` is `(x)`.
//! - `And`/`Or` are flat n-ary nodes; an `And` never has an `And` child
//!   (same for `Or`), and both always have at least two children.
//!
//! Simplification happens only at construction. `eval` never rewrites.

/// A boolean expression tree over leaves of type `L`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logic<L> {
    /// Constant truth value.
    Val(bool),
    /// A late-bound probe, resolved by the evaluator on every query.
    Eval(L),
    /// Grouping. Semantically the identity; kept so a tree can remember
    /// explicit parentheses without changing associativity flattening.
    Par(Box<Logic<L>>),
    /// Negation.
    Not(Box<Logic<L>>),
    /// Conjunction of two or more children, none of which is `And` or `Val`.
    And(Vec<Logic<L>>),
    /// Disjunction of two or more children, none of which is `Or` or `Val`.
    Or(Vec<Logic<L>>),
}

impl<L> Logic<L> {
    /// Wraps `self` in a grouping node, unless it already is one.
    pub fn grouped(self) -> Self {
        match self {
            grouped @ Logic::Par(_) => grouped,
            other => Logic::Par(Box::new(other)),
        }
    }

    /// Negates `self`, folding constants and cancelling double negation.
    pub fn negate(self) -> Self {
        match self {
            Logic::Val(value) => Logic::Val(!value),
            Logic::Not(inner) => *inner,
            other => Logic::Not(Box::new(other)),
        }
    }

    /// Conjoins `self` with `rhs`.
    ///
    /// Constants are folded (`false & x` is `false`, `true & x` is `x`),
    /// and `And` operands are flattened so the result is a single n-ary
    /// node with the operands' children in order.
    pub fn and(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Logic::Val(false), _) | (_, Logic::Val(false)) => Logic::Val(false),
            (Logic::Val(true), other) | (other, Logic::Val(true)) => other,
            (Logic::And(mut children), rhs) => {
                match rhs {
                    Logic::And(more) => children.extend(more),
                    other => children.push(other),
                }
                Logic::And(children)
            }
            (lhs, Logic::And(more)) => {
                let mut children = Vec::with_capacity(more.len() + 1);
                children.push(lhs);
                children.extend(more);
                Logic::And(children)
            }
            (lhs, rhs) => Logic::And(vec![lhs, rhs]),
        }
    }

    /// Disjoins `self` with `rhs`. Dual of [`Logic::and`].
    pub fn or(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Logic::Val(true), _) | (_, Logic::Val(true)) => Logic::Val(true),
            (Logic::Val(false), other) | (other, Logic::Val(false)) => other,
            (Logic::Or(mut children), rhs) => {
                match rhs {
                    Logic::Or(more) => children.extend(more),
                    other => children.push(other),
                }
                Logic::Or(children)
            }
            (lhs, Logic::Or(more)) => {
                let mut children = Vec::with_capacity(more.len() + 1);
                children.push(lhs);
                children.extend(more);
                Logic::Or(children)
            }
            (lhs, rhs) => Logic::Or(vec![lhs, rhs]),
        }
    }

    /// Evaluates the tree against the current state behind the leaves.
    ///
    /// `probe` resolves one leaf to its truth value. `And`/`Or` children
    /// are visited in insertion order and short-circuit, so a resolver
    /// with side effects (counters, live state) sees exactly the leaves
    /// that were needed.
    pub fn eval<F>(&self, probe: &mut F) -> bool
    where
        F: FnMut(&L) -> bool,
    {
        match self {
            Logic::Val(value) => *value,
            Logic::Eval(leaf) => probe(leaf),
            Logic::Par(inner) => inner.eval(probe),
            Logic::Not(inner) => !inner.eval(probe),
            Logic::And(children) => {
                for child in children {
                    if !child.eval(probe) {
                        return false;
                    }
                }
                true
            }
            Logic::Or(children) => {
                for child in children {
                    if child.eval(probe) {
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl<L> From<bool> for Logic<L> {
    fn from(value: bool) -> Self {
        Logic::Val(value)
    }
}

impl<L> std::ops::Not for Logic<L> {
    type Output = Logic<L>;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl<L> std::ops::BitAnd for Logic<L> {
    type Output = Logic<L>;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<L> std::ops::BitAnd<bool> for Logic<L> {
    type Output = Logic<L>;

    fn bitand(self, rhs: bool) -> Self::Output {
        self.and(Logic::Val(rhs))
    }
}

impl<L> std::ops::BitOr for Logic<L> {
    type Output = Logic<L>;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<L> std::ops::BitOr<bool> for Logic<L> {
    type Output = Logic<L>;

    fn bitor(self, rhs: bool) -> Self::Output {
        self.or(Logic::Val(rhs))
    }
}

#[cfg(test)]
mod tests;
