use super::*;
use crate::tensor::{DType, Shape};
use crate::term::Attrs;
use crate::test_utils::stores;

// ========== CONSTRUCTION ==========

#[test]
fn new_subst_is_empty() {
    let subst = Subst::new();
    assert!(subst.is_empty());
    assert_eq!(subst.len(), 0);
    assert!(subst.constraints().is_empty());
    assert!(subst.sites().is_empty());
}

#[test]
fn extend_leaves_original_untouched() {
    let (_, terms) = stores();
    let one = terms.scalar(1.0);
    let base = Subst::new();
    let next = base.extend(0, one);
    assert!(base.is_empty());
    assert_eq!(next.get(0), Some(one));
}

#[test]
fn branches_share_prefix_independently() {
    let (_, terms) = stores();
    let one = terms.scalar(1.0);
    let two = terms.scalar(2.0);
    let base = Subst::new().extend(0, one);
    let left = base.extend(1, one);
    let right = base.extend(1, two);
    assert_eq!(left.get(1), Some(one));
    assert_eq!(right.get(1), Some(two));
    assert_eq!(base.len(), 1);
}

// ========== DEREF ==========

#[test]
fn deref_follows_chains() {
    let (_, terms) = stores();
    let v0 = terms.var(0);
    let v1 = terms.var(1);
    let one = terms.scalar(1.0);
    let subst = Subst::new().extend(0, v1).extend(1, one);
    assert_eq!(subst.deref(v0, &terms), one);
}

#[test]
fn deref_stops_at_unbound() {
    let (_, terms) = stores();
    let v0 = terms.var(0);
    let v1 = terms.var(1);
    let subst = Subst::new().extend(0, v1);
    assert_eq!(subst.deref(v0, &terms), v1);
}

#[test]
fn deref_of_hand_built_cycle_terminates() {
    let (_, terms) = stores();
    let v0 = terms.var(0);
    let v1 = terms.var(1);
    let subst = Subst::new().extend(0, v1).extend(1, v0);
    let end = subst.deref(v0, &terms);
    assert!(end == v0 || end == v1);
}

// ========== REIFY ==========

#[test]
fn reify_substitutes_nested_bindings() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let x = terms.input(symbols.intern("x"));
    let v0 = terms.var(0);
    let v1 = terms.var(1);
    let pattern = terms.app2(add, v0, terms.app2(add, v1, v0));
    let subst = Subst::new().extend(0, x).extend(1, terms.scalar(2.0));
    let expected = terms.app2(add, x, terms.app2(add, terms.scalar(2.0), x));
    assert_eq!(subst.reify(pattern, &terms), expected);
}

#[test]
fn reify_keeps_attrs() {
    let (symbols, terms) = stores();
    let neg = symbols.intern("neg");
    let v0 = terms.var(0);
    let attrs = Attrs::new(DType::F32, Shape::scalar(), 0);
    let t = terms.app_with(neg, smallvec::smallvec![v0], attrs.clone());
    let x = terms.input(symbols.intern("x"));
    let subst = Subst::new().extend(0, x);
    let expected = terms.app_with(neg, smallvec::smallvec![x], attrs);
    assert_eq!(subst.reify(t, &terms), expected);
}

#[test]
fn reify_unchanged_term_keeps_id() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let t = terms.app2(add, terms.scalar(1.0), terms.scalar(2.0));
    assert_eq!(Subst::new().reify(t, &terms), t);
}

// ========== GROUNDNESS ==========

#[test]
fn first_unbound_finds_leftmost_variable() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let v3 = terms.var(3);
    let v4 = terms.var(4);
    let t = terms.app2(add, v3, v4);
    assert_eq!(Subst::new().first_unbound(t, &terms), Some(3));
    let subst = Subst::new().extend(3, terms.scalar(0.0));
    assert_eq!(subst.first_unbound(t, &terms), Some(4));
    assert!(!subst.is_ground(t, &terms));
}

#[test]
fn bound_term_is_ground() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let v0 = terms.var(0);
    let t = terms.app2(add, v0, v0);
    let subst = Subst::new().extend(0, terms.scalar(1.0));
    assert!(subst.is_ground(t, &terms));
}

// ========== SITES ==========

#[test]
fn sites_are_logged_in_order() {
    let (_, terms) = stores();
    let a = terms.scalar(1.0);
    let b = terms.scalar(2.0);
    let mut subst = Subst::new();
    subst.push_site(Site {
        matched: a,
        replacement: b,
    });
    subst.push_site(Site {
        matched: b,
        replacement: a,
    });
    assert_eq!(subst.sites().len(), 2);
    assert_eq!(subst.sites()[0].matched, a);
    assert_eq!(subst.sites()[1].matched, b);
}
