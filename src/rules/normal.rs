//! Reparameterisation of hierarchical normal log-densities.
//!
//! A centred hierarchy
//!
//! ```text
//! X ~ N(M, T)        contributes  ((X - M) / T)^2
//! Y ~ N(X, S)        contributes  ((Y - X) / S)^2
//! ```
//!
//! is numerically fragile when `T` is tiny. The non-centred form samples a
//! standardised `X` and shifts the child instead:
//!
//! ```text
//! X ~ N(0, 1)        contributes  X^2
//! Y ~ N(M + T*X, S)  contributes  ((Y - (M + T*X)) / S)^2
//! ```
//!
//! Both terms must be rewritten in the same step: rewriting only one of
//! them changes the model.

use super::Rule;
use crate::goal::neq;

pub fn recenter_normal() -> Rule {
    Rule::correlated("recenter_normal", |session| {
        let [x, mu, tau, y, sigma] = session.fresh_vars();

        let prior = Rule::pattern("standardize_prior", move |s, _| {
            let z = s.op("div", [s.op("sub", [x, mu]), tau]);
            (s.op("square", [z]), s.op("square", [x]))
        });

        let child = Rule::pattern("shift_child", move |s, _| {
            let lhs = s.op("square", [s.op("div", [s.op("sub", [y, x]), sigma])]);
            let shifted = s.op("add", [mu, s.op("mul", [tau, x])]);
            let rhs = s.op("square", [s.op("div", [s.op("sub", [y, shifted]), sigma])]);
            (lhs, rhs)
        });

        // The child must be a different variable than the one it depends on.
        (vec![prior, child], neq(y, x))
    })
}
