//! Elementary algebraic identities.
//!
//! These assume elementwise operands of matching shape. A rule such as
//! `x + 0 -> x` applied where `0` broadcasts `x` to a larger shape would
//! change the output contract, which the adapter then rejects.

use super::Rule;

/// `x + 0 -> x`, with the zero on either side.
pub fn add_zero() -> Rule {
    Rule::pattern("add_zero", |s, _| {
        let x = s.fresh();
        (s.op("add", [x, s.scalar(0.0)]), x)
    })
}

/// `x * 1 -> x`, with the one on either side.
pub fn mul_one() -> Rule {
    Rule::pattern("mul_one", |s, _| {
        let x = s.fresh();
        (s.op("mul", [x, s.scalar(1.0)]), x)
    })
}

/// `x - 0 -> x`
pub fn sub_zero() -> Rule {
    Rule::pattern("sub_zero", |s, _| {
        let x = s.fresh();
        (s.op("sub", [x, s.scalar(0.0)]), x)
    })
}

/// `x / 1 -> x`
pub fn div_one() -> Rule {
    Rule::pattern("div_one", |s, _| {
        let x = s.fresh();
        (s.op("div", [x, s.scalar(1.0)]), x)
    })
}

/// `-(-x) -> x`
pub fn neg_neg() -> Rule {
    Rule::pattern("neg_neg", |s, _| {
        let x = s.fresh();
        (s.op("neg", [s.op("neg", [x])]), x)
    })
}

/// `x * x -> square(x)`, also inside a longer product.
pub fn mul_self() -> Rule {
    Rule::pattern_ac("mul_self", |s, _| {
        let x = s.fresh();
        (s.op("mul", [x, x]), s.op("square", [x]))
    })
}

/// All of the above, tried at the same position.
pub fn identities() -> Rule {
    Rule::any(
        "identities",
        vec![add_zero(), mul_one(), sub_zero(), div_one(), neg_neg(), mul_self()],
    )
}
