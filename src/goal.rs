//! Goals: relations over substitutions.
//!
//! A goal maps a substitution to a lazy stream of extended substitutions.
//! Goals are cheap to clone and are only run when their stream is pulled.

use crate::constraint::add_disequality;
use crate::session::Session;
use crate::stream::{Solutions, Stream};
use crate::subst::{Site, Subst};
use crate::term::TermId;
use crate::trace::trace;
use crate::unify::unify;
use std::fmt;
use std::sync::Arc;

type GoalFn = dyn Fn(&Session, Subst) -> Stream + Send + Sync;

#[derive(Clone)]
pub struct Goal(Arc<GoalFn>);

impl Goal {
    pub fn new(f: impl Fn(&Session, Subst) -> Stream + Send + Sync + 'static) -> Self {
        Goal(Arc::new(f))
    }

    /// Apply the goal to a substitution. The returned stream is lazy.
    pub fn apply(&self, session: &Session, subst: Subst) -> Stream {
        (self.0)(session, subst)
    }

    /// Iterate over the answers of this goal from the empty substitution.
    pub fn solve<'s>(&self, session: &'s Session) -> Solutions<'s> {
        self.solve_from(session, Subst::new())
    }

    pub fn solve_from<'s>(&self, session: &'s Session, subst: Subst) -> Solutions<'s> {
        Solutions::new(Stream::Apply(self.clone(), subst), session)
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Goal(..)")
    }
}

/// Always succeeds once with the input substitution.
pub fn succeed() -> Goal {
    Goal::new(|_, subst| Stream::unit(subst))
}

/// Never succeeds.
pub fn fail() -> Goal {
    Goal::new(|_, _| Stream::Empty)
}

/// Unify `a` and `b`.
pub fn eq(a: TermId, b: TermId) -> Goal {
    Goal::new(move |session, subst| unify_stream(a, b, session, subst))
}

/// Stream form of `eq`, shared with goals that fall back to plain
/// unification.
pub(crate) fn unify_stream(a: TermId, b: TermId, session: &Session, subst: Subst) -> Stream {
    match unify(a, b, &subst, session.terms()) {
        Some(next) => {
            session.metrics().record_unification();
            Stream::unit(next)
        }
        None => {
            session.metrics().record_unification_failure();
            Stream::Empty
        }
    }
}

/// Require that `a` and `b` never become equal.
///
/// Fails at once if they are already equal. Otherwise the disequality is
/// carried by the substitution and any later binding that makes the sides
/// equal fails that branch.
pub fn neq(a: TermId, b: TermId) -> Goal {
    Goal::new(move |session, subst| {
        match add_disequality(subst, a, b, session.terms()) {
            Some(next) => Stream::unit(next),
            None => {
                session.metrics().record_disequality_failure();
                Stream::Empty
            }
        }
    })
}

/// Conjunction: every answer of the first goal is fed to the second, and
/// so on. An empty conjunction succeeds.
pub fn conj(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let mut goals: Vec<Goal> = goals.into_iter().collect();
    match goals.len() {
        0 => succeed(),
        1 => goals.remove(0),
        _ => Goal::new(move |_, subst| {
            let mut rest = goals.iter();
            let mut stream = match rest.next() {
                Some(first) => Stream::Apply(first.clone(), subst),
                None => return Stream::unit(subst),
            };
            for goal in rest {
                stream = Stream::Bind(Box::new(stream), goal.clone());
            }
            stream
        }),
    }
}

/// Disjunction: the fair interleaving of every branch. An empty
/// disjunction fails.
pub fn disj(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let mut goals: Vec<Goal> = goals.into_iter().collect();
    match goals.len() {
        0 => fail(),
        1 => goals.remove(0),
        _ => Goal::new(move |_, subst| {
            Stream::any(
                goals
                    .iter()
                    .map(|goal| Stream::Apply(goal.clone(), subst.clone())),
            )
        }),
    }
}

/// Build the goal only when it is applied.
///
/// Use this when constructing the goal allocates fresh variables or
/// recurses, so that nothing happens for branches that are never pulled.
pub fn defer(build: impl Fn(&Session) -> Goal + Send + Sync + 'static) -> Goal {
    Goal::new(move |session, subst| build(session).apply(session, subst))
}

/// Log that `matched` was rewritten to `replacement` on this branch.
pub fn record_site(matched: TermId, replacement: TermId) -> Goal {
    Goal::new(move |session, mut subst| {
        trace!(?matched, ?replacement, "site_recorded");
        session.metrics().record_rule_match();
        subst.push_site(Site {
            matched,
            replacement,
        });
        Stream::unit(subst)
    })
}

#[cfg(test)]
#[path = "tests/goal.rs"]
mod tests;
