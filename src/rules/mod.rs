//! Rewrite rules and the rule library.
//!
//! A [`Rule`] is a relation between an input term and an output term. The
//! walker decides where a rule is tried; the rule only decides what happens
//! at that position.

pub mod algebra;
pub mod normal;

use crate::comm::eq_comm;
use crate::goal::{conj, disj, eq, Goal};
use crate::session::Session;
use crate::term::{Term, TermId};
use crate::walk::rewrite_sites;
use std::fmt;
use std::sync::Arc;

pub use algebra::{add_zero, div_one, identities, mul_one, mul_self, neg_neg, sub_zero};
pub use normal::recenter_normal;

type Relation = dyn Fn(&Session, TermId, TermId) -> Goal + Send + Sync;

#[derive(Clone)]
pub struct Rule {
    name: Arc<str>,
    relation: Arc<Relation>,
}

impl Rule {
    pub fn new(
        name: &str,
        relation: impl Fn(&Session, TermId, TermId) -> Goal + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name),
            relation: Arc::new(relation),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The goal relating `input` to `output` at one position.
    pub fn relate(&self, session: &Session, input: TermId, output: TermId) -> Goal {
        (self.relation)(session, input, output)
    }

    /// A rule given by a left-hand and a right-hand pattern.
    ///
    /// `build` receives a fresh witness variable that is bound to the exact
    /// subterm the left-hand side matched, before any reordering of
    /// commutative operands. A replacement that mentions the witness keeps
    /// the matched node as it was. The left-hand side is matched with
    /// [`eq_comm`]. Fresh pattern variables are allocated per application.
    pub fn pattern(
        name: &str,
        build: impl Fn(&Session, TermId) -> (TermId, TermId) + Send + Sync + 'static,
    ) -> Self {
        Rule::new(name, move |session, input, output| {
            let witness = session.fresh();
            let (lhs, rhs) = build(session, witness);
            conj([eq_comm(input, lhs), eq(witness, input), eq(output, rhs)])
        })
    }

    /// Like [`Rule::pattern`], but when the left-hand side is an
    /// application of an associative and commutative operator it may also
    /// match part of a longer chain of that operator. The rest of the chain
    /// is bound to a fresh variable and kept beside the replacement.
    pub fn pattern_ac(
        name: &str,
        build: impl Fn(&Session, TermId) -> (TermId, TermId) + Send + Sync + 'static,
    ) -> Self {
        Rule::new(name, move |session, input, output| {
            let witness = session.fresh();
            let (lhs, rhs) = build(session, witness);
            let exact = conj([eq_comm(input, lhs), eq(witness, input), eq(output, rhs)]);
            let terms = session.terms();
            let facts = session.facts();
            match terms.resolve(lhs) {
                Some(Term::App(op, _, _))
                    if facts.is_commutative(op) && facts.is_associative(op) =>
                {
                    let rest = session.fresh();
                    let within = conj([
                        eq_comm(input, terms.app2(op, lhs, rest)),
                        eq(witness, input),
                        eq(output, terms.app2(op, rhs, rest)),
                    ]);
                    disj([exact, within])
                }
                _ => exact,
            }
        })
    }

    /// Try each rule at the same position.
    pub fn any(name: &str, rules: Vec<Rule>) -> Self {
        Rule::new(name, move |session, input, output| {
            disj(rules.iter().map(|rule| rule.relate(session, input, output)))
        })
    }

    /// A rule that rewrites several correlated sites in one step.
    ///
    /// `build` returns the site rules and a guard goal. Site rules share
    /// pattern variables, so a variable bound while matching one site
    /// constrains the others. Each site is located anywhere in the term
    /// produced by the previous one, and the guard runs once all sites have
    /// matched.
    pub fn correlated(
        name: &str,
        build: impl Fn(&Session) -> (Vec<Rule>, Goal) + Send + Sync + 'static,
    ) -> Self {
        Rule::new(name, move |session, input, output| {
            let (sites, guard) = build(session);
            conj([rewrite_sites(sites, input, output), guard])
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

#[cfg(test)]
#[path = "../tests/rules.rs"]
mod tests;
