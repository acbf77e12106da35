use super::*;
use crate::test_utils::setup;

fn values(session: &Session, goal: &Goal, var: TermId) -> Vec<TermId> {
    goal.solve(session)
        .map(|s| s.reify(var, session.terms()))
        .collect()
}

/// `var` is `n`, `n + 1`, `n + 2`, ...
fn counting_from(var: TermId, n: f64) -> Goal {
    defer(move |session| {
        disj([
            eq(var, session.scalar(n)),
            counting_from(var, n + 1.0),
        ])
    })
}

// ========== PRIMITIVES ==========

#[test]
fn succeed_yields_input() {
    let session = setup();
    assert_eq!(succeed().solve(&session).count(), 1);
}

#[test]
fn fail_yields_nothing() {
    let session = setup();
    assert_eq!(fail().solve(&session).count(), 0);
}

#[test]
fn eq_binds_variable() {
    let session = setup();
    let v = session.fresh();
    let x = session.input("x");
    assert_eq!(values(&session, &eq(v, x), v), vec![x]);
}

#[test]
fn eq_of_distinct_constants_fails() {
    let session = setup();
    let goal = eq(session.scalar(1.0), session.scalar(2.0));
    assert_eq!(goal.solve(&session).count(), 0);
}

// ========== CONJUNCTION / DISJUNCTION ==========

#[test]
fn conj_threads_bindings() {
    let session = setup();
    let [a, b] = session.fresh_vars();
    let x = session.input("x");
    let goal = conj([eq(a, x), eq(b, a)]);
    assert_eq!(values(&session, &goal, b), vec![x]);
}

#[test]
fn conj_fails_when_any_goal_fails() {
    let session = setup();
    let a = session.fresh();
    let goal = conj([eq(a, session.scalar(1.0)), eq(a, session.scalar(2.0))]);
    assert_eq!(goal.solve(&session).count(), 0);
}

#[test]
fn empty_conj_succeeds() {
    let session = setup();
    assert_eq!(conj(Vec::new()).solve(&session).count(), 1);
}

#[test]
fn disj_collects_all_branches() {
    let session = setup();
    let v = session.fresh();
    let one = session.scalar(1.0);
    let two = session.scalar(2.0);
    let goal = disj([eq(v, one), eq(v, two)]);
    assert_eq!(values(&session, &goal, v), vec![one, two]);
}

#[test]
fn empty_disj_fails() {
    let session = setup();
    assert_eq!(disj(Vec::new()).solve(&session).count(), 0);
}

#[test]
fn infinite_disj_is_consumed_lazily() {
    let session = setup();
    let v = session.fresh();
    let firsts: Vec<_> = counting_from(v, 0.0)
        .solve(&session)
        .take(3)
        .map(|s| s.reify(v, session.terms()))
        .collect();
    let expected: Vec<_> = [0.0, 1.0, 2.0].iter().map(|n| session.scalar(*n)).collect();
    assert_eq!(firsts, expected);
}

#[test]
fn conj_with_infinite_first_goal_still_filters() {
    let session = setup();
    let v = session.fresh();
    let goal = conj([counting_from(v, 0.0), eq(v, session.scalar(4.0))]);
    let first = goal.solve(&session).next().unwrap();
    assert_eq!(first.reify(v, session.terms()), session.scalar(4.0));
}

// ========== DISEQUALITY ==========

#[test]
fn neq_of_equal_terms_fails() {
    let session = setup();
    let x = session.input("x");
    assert_eq!(neq(x, x).solve(&session).count(), 0);
}

#[test]
fn neq_of_distinct_terms_succeeds() {
    let session = setup();
    let goal = neq(session.input("x"), session.input("y"));
    assert_eq!(goal.solve(&session).count(), 1);
}

#[test]
fn neq_attached_then_violated_fails() {
    let session = setup();
    let v = session.fresh();
    let x = session.input("x");
    let goal = conj([neq(v, x), eq(v, x)]);
    assert_eq!(goal.solve(&session).count(), 0);
}

#[test]
fn neq_attached_then_satisfied_succeeds() {
    let session = setup();
    let v = session.fresh();
    let x = session.input("x");
    let y = session.input("y");
    let goal = conj([neq(v, x), eq(v, y)]);
    let answers: Vec<_> = goal.solve(&session).collect();
    assert_eq!(answers.len(), 1);
    assert!(answers[0].constraints().is_empty());
}

#[test]
fn neq_prunes_one_disjunct() {
    let session = setup();
    let v = session.fresh();
    let x = session.input("x");
    let y = session.input("y");
    let goal = conj([neq(v, x), disj([eq(v, x), eq(v, y)])]);
    assert_eq!(values(&session, &goal, v), vec![y]);
}

// ========== SITES ==========

#[test]
fn record_site_logs_match() {
    let session = setup();
    let x = session.input("x");
    let y = session.input("y");
    let answers: Vec<_> = record_site(x, y).solve(&session).collect();
    assert_eq!(answers.len(), 1);
    assert_eq!(
        answers[0].sites(),
        &[Site {
            matched: x,
            replacement: y
        }]
    );
}

#[test]
fn defer_builds_on_each_application() {
    let session = setup();
    let v = session.fresh();
    let goal = defer(move |s| eq(v, s.scalar(7.0)));
    assert_eq!(values(&session, &goal, v), vec![session.scalar(7.0)]);
    assert_eq!(values(&session, &goal, v), vec![session.scalar(7.0)]);
}
