use super::*;
use crate::rules::{add_zero, identities, mul_one, mul_self, Rule};
use crate::test_utils::setup;

/// `a -> b` and `b -> a` on two input leaves.
fn swap_leaves() -> Rule {
    Rule::new("swap_leaves", |session, input, output| {
        let a = session.input("a");
        let b = session.input("b");
        crate::goal::disj([
            crate::goal::conj([crate::goal::eq(input, a), crate::goal::eq(output, b)]),
            crate::goal::conj([crate::goal::eq(input, b), crate::goal::eq(output, a)]),
        ])
    })
}

/// `f(x) -> f(f(x))`: every result can be rewritten again.
fn grow() -> Rule {
    Rule::pattern("grow", |s, _| {
        let x = s.fresh();
        let lhs = s.op("f", [x]);
        (lhs, s.op("f", [lhs]))
    })
}

#[test]
fn unmatched_term_is_its_own_fixpoint() {
    let session = setup();
    let x = session.input("x");
    let r = reduce_to_fixpoint(&session, &add_zero(), x).once().unwrap();
    assert_eq!(r, Reduction { term: x, steps: 0 });
}

#[test]
fn reduces_until_no_rule_applies() {
    let session = setup();
    let x = session.input("x");
    let zero = session.scalar(0.0);
    let one = session.scalar(1.0);
    // (x * 1) + 0, then x * 1, then x
    let term = session.op("add", [session.op("mul", [x, one]), zero]);
    let r = reduce_to_fixpoint(&session, &identities(), term).once().unwrap();
    assert_eq!(r.term, x);
    assert_eq!(r.steps, 2);
}

#[test]
fn fixpoint_is_idempotent() {
    let session = setup();
    let x = session.input("x");
    let term = session.op("neg", [session.op("neg", [session.op("add", [x, session.scalar(0.0)])])]);
    let first = reduce_to_fixpoint(&session, &identities(), term).once().unwrap();
    let again = reduce_to_fixpoint(&session, &identities(), first.term).once().unwrap();
    assert_eq!(again.term, first.term);
    assert_eq!(again.steps, 0);
}

#[test]
fn all_fixpoints_are_distinct() {
    let session = setup();
    let x = session.input("x");
    let one = session.scalar(1.0);
    let term = session.op("mul", [session.op("mul", [x, one]), one]);
    let all = reduce_to_fixpoint(&session, &mul_one(), term).all(None).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].term, x);
}

#[test]
fn cycles_terminate_without_fixpoint() {
    let session = setup();
    let a = session.input("a");
    let result = reduce_to_fixpoint(&session, &swap_leaves(), a).once();
    assert_eq!(result, Err(RewriteError::PatternNotFound));
}

#[test]
fn step_limit_cuts_unbounded_growth() {
    let session = setup();
    let x = session.input("x");
    let term = session.op("f", [x]);
    let result = reduce_to_fixpoint(&session, &grow(), term)
        .with_step_limit(Some(5))
        .once();
    assert_eq!(result, Err(RewriteError::StepLimitExceeded { limit: 5 }));
}

#[test]
fn limit_hit_is_observable_while_iterating() {
    let session = setup();
    let term = session.op("f", [session.input("x")]);
    let mut fixpoints = reduce_to_fixpoint(&session, &grow(), term).with_step_limit(Some(2));
    assert!(!fixpoints.limit_hit());
    assert!(fixpoints.next().is_none());
    assert!(fixpoints.limit_hit());
}

#[test]
fn limit_hit_stays_clear_without_a_limit_cut() {
    let session = setup();
    let x = session.input("x");
    let term = session.op("add", [x, session.scalar(0.0)]);
    let mut fixpoints = reduce_to_fixpoint(&session, &add_zero(), term).with_step_limit(Some(5));
    assert!(fixpoints.next().is_some());
    assert!(!fixpoints.limit_hit());
}

#[test]
fn all_reports_step_limit_when_nothing_found() {
    let session = setup();
    let term = session.op("f", [session.input("x")]);
    let result = reduce_to_fixpoint(&session, &grow(), term)
        .with_step_limit(Some(3))
        .all(None);
    assert_eq!(result, Err(RewriteError::StepLimitExceeded { limit: 3 }));
}

#[test]
fn max_results_bounds_enumeration() {
    let session = setup();
    let x = session.input("x");
    let zero = session.scalar(0.0);
    let term = session.op("add", [x, zero]);
    let all = reduce_to_fixpoint(&session, &add_zero(), term)
        .all(Some(0))
        .unwrap();
    assert!(all.is_empty());
}

#[test]
fn apply_once_rewrites_one_position() {
    let session = setup();
    let x = session.input("x");
    let zero = session.scalar(0.0);
    let inner = session.op("add", [x, zero]);
    let term = session.op("add", [inner, zero]);
    let next = apply_once(&session, &add_zero(), term).unwrap();
    assert_eq!(next, inner);
}

#[test]
fn apply_once_without_match_fails() {
    let session = setup();
    let x = session.input("x");
    assert_eq!(
        apply_once(&session, &add_zero(), x),
        Err(RewriteError::PatternNotFound)
    );
}

#[test]
fn square_found_inside_longer_product() {
    let session = setup();
    let x = session.input("x");
    let y = session.input("y");
    // x * (x * y) -> square(x) * y
    let term = session.op("mul", [x, session.op("mul", [x, y])]);
    let r = reduce_to_fixpoint(&session, &mul_self(), term).once().unwrap();
    assert_eq!(r.term, session.op("mul", [session.op("square", [x]), y]));
    assert_eq!(r.steps, 1);
}
