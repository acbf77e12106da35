//! Disequality constraints.
//!
//! A disequality `lhs != rhs` whose sides are already distinct succeeds
//! outright. If the sides could still be made equal it is attached to the
//! substitution and re-examined after every binding: it is dropped once the
//! sides can no longer unify, and the branch fails once they are identical.

use crate::subst::Subst;
use crate::term::{TermId, TermStore};
use crate::unify::unify_bindings;

use crate::trace::trace;

/// A pending disequality `lhs != rhs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Disequality {
    pub lhs: TermId,
    pub rhs: TermId,
}

/// State of a disequality under a particular substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The sides can never unify; the constraint can be forgotten.
    Satisfied,
    /// The sides are already equal.
    Violated,
    /// Unifying the sides would need more bindings.
    Pending,
}

/// Decide a disequality against a substitution.
pub fn check(diseq: &Disequality, subst: &Subst, terms: &TermStore) -> Verdict {
    match unify_bindings(diseq.lhs, diseq.rhs, subst, terms) {
        None => Verdict::Satisfied,
        Some(extended) if extended.len() == subst.len() => Verdict::Violated,
        Some(_) => Verdict::Pending,
    }
}

/// Attach `lhs != rhs` to a substitution.
///
/// Returns None when the sides are already equal.
pub fn add_disequality(
    mut subst: Subst,
    lhs: TermId,
    rhs: TermId,
    terms: &TermStore,
) -> Option<Subst> {
    let diseq = Disequality { lhs, rhs };
    match check(&diseq, &subst, terms) {
        Verdict::Satisfied => Some(subst),
        Verdict::Violated => None,
        Verdict::Pending => {
            subst.push_constraint(diseq);
            Some(subst)
        }
    }
}

/// Re-examine every attached disequality after new bindings were made.
///
/// Satisfied constraints are dropped; any violated one fails the branch.
pub fn revalidate(mut subst: Subst, terms: &TermStore) -> Option<Subst> {
    if subst.constraints().is_empty() {
        return Some(subst);
    }
    let mut pending = Vec::with_capacity(subst.constraints().len());
    for diseq in subst.constraints() {
        match check(diseq, &subst, terms) {
            Verdict::Satisfied => {}
            Verdict::Pending => pending.push(*diseq),
            Verdict::Violated => {
                trace!(lhs = ?diseq.lhs, rhs = ?diseq.rhs, "disequality_violated");
                return None;
            }
        }
    }
    subst.set_constraints(pending);
    Some(subst)
}

#[cfg(test)]
#[path = "tests/constraint.rs"]
mod tests;
