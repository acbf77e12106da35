use crate::constraint::revalidate;
use crate::subst::Subst;
use crate::term::{Term, TermId, TermStore};
use smallvec::SmallVec;

use crate::trace::{debug_span, trace};

/// Unify two terms under `subst`, returning the extended substitution.
///
/// Returns None if the terms cannot be made equal or if a new binding
/// violates one of the disequalities carried by `subst`. On success the
/// result has the same bindings as `subst` plus whatever the match needed;
/// identical terms leave it unchanged.
pub fn unify(a: TermId, b: TermId, subst: &Subst, terms: &TermStore) -> Option<Subst> {
    let extended = unify_bindings(a, b, subst, terms)?;
    if extended.len() == subst.len() {
        return Some(extended);
    }
    revalidate(extended, terms)
}

/// Structural unification without re-checking disequalities.
///
/// Uses an explicit worklist. Operand lists are matched left to right and
/// the occurs check rejects bindings that would make a term contain itself.
pub(crate) fn unify_bindings(
    t1: TermId,
    t2: TermId,
    subst: &Subst,
    terms: &TermStore,
) -> Option<Subst> {
    let _span = debug_span!("unify", ?t1, ?t2).entered();

    let mut subst = subst.clone();
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((t1, t2));

    while let Some((a, b)) = worklist.pop() {
        let a_deref = subst.deref(a, terms);
        let b_deref = subst.deref(b, terms);

        if a_deref == b_deref {
            continue;
        }

        match (terms.resolve(a_deref), terms.resolve(b_deref)) {
            (Some(Term::Var(idx_a)), Some(Term::Var(idx_b))) => {
                // Bind the younger variable to the older one.
                if idx_a < idx_b {
                    subst.bind(idx_b, a_deref);
                } else {
                    subst.bind(idx_a, b_deref);
                }
            }
            (Some(Term::Var(idx)), Some(_)) => {
                if occurs(idx, b_deref, &subst, terms) {
                    trace!(var = idx, "unify_occurs_check_failed");
                    return None;
                }
                subst.bind(idx, b_deref);
            }
            (Some(_), Some(Term::Var(idx))) => {
                if occurs(idx, a_deref, &subst, terms) {
                    trace!(var = idx, "unify_occurs_check_failed");
                    return None;
                }
                subst.bind(idx, a_deref);
            }
            (Some(Term::Ground(g1)), Some(Term::Ground(g2))) => {
                if !g1.value_eq(&g2) {
                    trace!("unify_value_mismatch");
                    return None;
                }
            }
            (Some(Term::App(f1, children1, attrs1)), Some(Term::App(f2, children2, attrs2))) => {
                if f1 != f2 || children1.len() != children2.len() {
                    trace!("unify_functor_mismatch");
                    return None;
                }
                if !attrs1.compatible(&attrs2) {
                    trace!("unify_attrs_mismatch");
                    return None;
                }
                // Pushed in reverse so the leftmost pair is popped first.
                for (c1, c2) in children1.iter().zip(children2.iter()).rev() {
                    worklist.push((*c1, *c2));
                }
            }
            _ => {
                trace!("unify_kind_mismatch");
                return None;
            }
        }
    }

    Some(subst)
}

/// Unify two operand lists pairwise, threading the substitution.
pub fn unify_all(xs: &[TermId], ys: &[TermId], subst: &Subst, terms: &TermStore) -> Option<Subst> {
    if xs.len() != ys.len() {
        return None;
    }
    let mut current = subst.clone();
    for (x, y) in xs.iter().zip(ys) {
        current = unify(*x, *y, &current, terms)?;
    }
    Some(current)
}

/// Occurs check: does variable `var` occur in term `term`?
fn occurs(var: u32, term: TermId, subst: &Subst, terms: &TermStore) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);

    while let Some(t) = stack.pop() {
        match terms.resolve(subst.deref(t, terms)) {
            Some(Term::Var(idx)) if idx == var => return true,
            Some(Term::App(_, children, _)) => stack.extend(children.iter().copied()),
            _ => {}
        }
    }

    false
}

#[cfg(test)]
#[path = "tests/unify.rs"]
mod tests;
