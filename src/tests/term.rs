use super::*;
use crate::test_utils::stores;

// ========== HASHCONSING ==========

#[test]
fn structurally_equal_terms_share_id() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let x = terms.input(symbols.intern("x"));
    let one = terms.scalar(1.0);
    assert_eq!(terms.app2(add, x, one), terms.app2(add, x, one));
}

#[test]
fn operand_order_matters() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let x = terms.input(symbols.intern("x"));
    let one = terms.scalar(1.0);
    assert_ne!(terms.app2(add, x, one), terms.app2(add, one, x));
}

#[test]
fn attrs_distinguish_terms() {
    let (symbols, terms) = stores();
    let neg = symbols.intern("neg");
    let x = terms.input(symbols.intern("x"));
    let bare = terms.app1(neg, x);
    let typed = terms.app_with(
        neg,
        smallvec::smallvec![x],
        Attrs::new(DType::F32, Shape::scalar(), 0),
    );
    assert_ne!(bare, typed);
}

#[test]
fn constants_hashcons_by_value() {
    let (_, terms) = stores();
    assert_eq!(terms.scalar(2.5), terms.scalar(2.5));
    assert_ne!(terms.scalar(2.5), terms.scalar(3.5));
}

#[test]
fn negative_zero_folds_into_zero() {
    let (_, terms) = stores();
    assert_eq!(terms.scalar(-0.0), terms.scalar(0.0));
}

// ========== VARIABLES ==========

#[test]
fn fresh_vars_are_distinct() {
    let (_, terms) = stores();
    let [a, b, c] = terms.fresh_vars();
    assert_ne!(a, b);
    assert_ne!(b, c);
    assert!(terms.is_var(a).is_some());
}

#[test]
fn fresh_var_skips_explicit_indices() {
    let (_, terms) = stores();
    let v7 = terms.var(7);
    let fresh = terms.fresh_var();
    assert_eq!(terms.is_var(v7), Some(7));
    assert!(terms.is_var(fresh).unwrap() > 7);
}

#[test]
fn named_var_is_singleton() {
    let (symbols, terms) = stores();
    let x = symbols.intern("X");
    assert_eq!(terms.named_var(x), terms.named_var(x));
    assert_ne!(terms.named_var(x), terms.fresh_var());
}

// ========== ATTRIBUTES ==========

#[test]
fn empty_attrs_are_compatible_with_anything() {
    let typed = Attrs::new(DType::F64, Shape::new(&[3]), 0);
    assert!(Attrs::default().compatible(&typed));
    assert!(typed.compatible(&Attrs::default()));
}

#[test]
fn conflicting_attrs_are_incompatible() {
    let a = Attrs::new(DType::F64, Shape::scalar(), 0);
    let b = Attrs::new(DType::F32, Shape::scalar(), 0);
    let c = Attrs::new(DType::F64, Shape::scalar(), 1);
    assert!(!a.compatible(&b));
    assert!(!a.compatible(&c));
}

// ========== CONSTANTS ==========

#[test]
fn constant_value_eq_ignores_dtype() {
    let t = Tensor::scalar(1.0);
    let a = Constant::from_tensor(&t, DType::F32);
    let b = Constant::from_tensor(&t, DType::F64);
    assert_ne!(a, b);
    assert!(a.value_eq(&b));
}

#[test]
fn constant_round_trips_tensor() {
    let t = Tensor::vector(vec![1.0, -2.0, 3.5]);
    let c = Constant::from_tensor(&t, DType::F64);
    assert_eq!(c.to_tensor(), t);
    assert_eq!(c.as_scalar(), None);
}

// ========== FORMATTING ==========

#[test]
fn format_prefix_notation() {
    let (symbols, terms) = stores();
    let mul = symbols.intern("mul");
    let square = symbols.intern("square");
    let x = terms.input(symbols.intern("x"));
    let t = terms.app2(mul, terms.scalar(-0.5), terms.app1(square, x));
    assert_eq!(
        format_term(t, &terms, &symbols).unwrap(),
        "(mul -0.5 (square x))"
    );
}

#[test]
fn format_variables_and_arrays() {
    let (symbols, terms) = stores();
    let add = symbols.intern("add");
    let v = terms.var(3);
    let arr = terms.constant(Constant::from_tensor(
        &Tensor::vector(vec![1.0, 2.0]),
        DType::F64,
    ));
    let t = terms.app2(add, v, arr);
    assert_eq!(format_term(t, &terms, &symbols).unwrap(), "(add $3 [1 2])");
}
