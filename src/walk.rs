//! Graph walker: apply a rule at any one position of a term.
//!
//! `rewrite_anywhere` relates a term to every copy of it in which the rule
//! fired at exactly one position, the root or any descendant. Positions are
//! explored lazily: a subterm is only visited when the consumer pulls the
//! stream that far.

use crate::error::RewriteError;
use crate::goal::{conj, defer, eq, record_site, Goal};
use crate::rules::Rule;
use crate::session::Session;
use crate::stream::{Solutions, Stream};
use crate::subst::Subst;
use crate::term::{TermId, TermStore};
use crate::trace::{debug, trace};
use hashbrown::{HashMap, HashSet};

/// `output` is `input` with `rule` applied at one position.
///
/// Positions are paths, not terms: a hashconsed subterm reached through
/// several parents is rewritten at one occurrence per step and the other
/// occurrences keep the old subterm. Rebuilding such a result yields a
/// graph in which the old and the new node both survive.
pub fn rewrite_anywhere(rule: &Rule, input: TermId, output: TermId) -> Goal {
    let rule = rule.clone();
    Goal::new(move |session, subst| {
        // Unbound positions are holes left by a rule, not graph structure.
        let terms = session.terms();
        if terms.is_var(subst.deref(input, terms)).is_some() {
            return Stream::Empty;
        }
        let at_root = {
            let rule = rule.clone();
            let subst = subst.clone();
            Stream::lazy(move |session| {
                conj([
                    rule.relate(session, input, output),
                    record_site(input, output),
                ])
                .apply(session, subst)
            })
        };
        let below = {
            let rule = rule.clone();
            Stream::lazy(move |session| rewrite_below(&rule, input, output, session, subst))
        };
        Stream::mplus(at_root, below)
    })
}

/// One branch per operand of `input`: rewrite that operand somewhere and
/// rebuild the node around it with the same operator and attributes.
fn rewrite_below(
    rule: &Rule,
    input: TermId,
    output: TermId,
    session: &Session,
    subst: Subst,
) -> Stream {
    let terms = session.terms();
    let node = subst.deref(input, terms);
    let Some((op, args, attrs)) = terms.is_app(node) else {
        return Stream::Empty;
    };
    Stream::any((0..args.len()).map(|i| {
        let rule = rule.clone();
        let args = args.clone();
        let attrs = attrs.clone();
        let subst = subst.clone();
        Stream::lazy(move |session| {
            let terms = session.terms();
            let child = args[i];
            let child_out = terms.fresh_var();
            let mut rebuilt = args;
            rebuilt[i] = child_out;
            let rebuilt = terms.app_with(op, rebuilt, attrs);
            conj([rewrite_anywhere(&rule, child, child_out), eq(output, rebuilt)])
                .apply(session, subst)
        })
    }))
}

/// Chain several walkers: each site is rewritten somewhere in the result of
/// the previous one. With no sites `output` is `input`.
pub fn rewrite_sites(sites: Vec<Rule>, input: TermId, output: TermId) -> Goal {
    if sites.is_empty() {
        return eq(input, output);
    }
    defer(move |session| {
        let mut goals = Vec::with_capacity(sites.len());
        let mut current = input;
        for (i, site) in sites.iter().enumerate() {
            let next = if i + 1 == sites.len() {
                output
            } else {
                session.fresh()
            };
            goals.push(rewrite_anywhere(site, current, next));
            current = next;
        }
        conj(goals)
    })
}

/// Check that no term was given two different replacements on one branch.
pub fn check_sites(subst: &Subst, terms: &TermStore) -> Result<(), RewriteError> {
    let mut seen: HashMap<TermId, TermId> = HashMap::new();
    for site in subst.sites() {
        let matched = subst.reify(site.matched, terms);
        let replacement = subst.reify(site.replacement, terms);
        match seen.get(&matched) {
            Some(&first) if first != replacement => {
                return Err(RewriteError::ReificationInconsistency {
                    node: matched,
                    first,
                    second: replacement,
                });
            }
            Some(_) => {}
            None => {
                seen.insert(matched, replacement);
            }
        }
    }
    Ok(())
}

/// The distinct single-step rewrites of a term, in the order found.
pub struct Walk<'s> {
    session: &'s Session,
    output: TermId,
    solutions: Solutions<'s>,
    seen: HashSet<TermId>,
}

/// Enumerate every way `rule` rewrites `input` at one position.
pub fn walk<'s>(session: &'s Session, rule: &Rule, input: TermId) -> Walk<'s> {
    let output = session.fresh();
    let solutions = rewrite_anywhere(rule, input, output).solve(session);
    trace!(rule = rule.name(), ?input, "walk_start");
    Walk {
        session,
        output,
        solutions,
        seen: HashSet::new(),
    }
}

impl<'s> Iterator for Walk<'s> {
    type Item = Result<TermId, RewriteError>;

    fn next(&mut self) -> Option<Self::Item> {
        let terms = self.session.terms();
        loop {
            let subst = self.solutions.next()?;
            if let Err(e) = check_sites(&subst, terms) {
                debug!(error = %e, "walk_inconsistent_sites");
                return Some(Err(e));
            }
            let result = subst.reify(self.output, terms);
            if self.seen.insert(result) {
                self.session.metrics().record_walk_result();
                return Some(Ok(result));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/walk.rs"]
mod tests;
