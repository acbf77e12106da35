//! Fixpoint driver: apply a rule repeatedly until nothing changes.
//!
//! Rewrites are explored depth first. A term is a fixpoint when the walker
//! finds no rewrite of it other than itself. Terms already explored are not
//! explored again, which both cuts rewrite cycles and keeps confluent paths
//! from being repeated.

use crate::error::RewriteError;
use crate::rules::Rule;
use crate::session::Session;
use crate::term::TermId;
use crate::trace::{debug, trace, warn};
use crate::walk::{walk, Walk};
use hashbrown::HashSet;

/// A fixpoint and the number of rewrite steps that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub term: TermId,
    pub steps: usize,
}

struct Frame<'s> {
    term: TermId,
    depth: usize,
    successors: Walk<'s>,
    moved: bool,
}

/// Lazy stream of the fixpoints reachable from a term.
pub struct Fixpoint<'s> {
    session: &'s Session,
    rule: Rule,
    stack: Vec<Frame<'s>>,
    expanded: HashSet<TermId>,
    yielded: HashSet<TermId>,
    step_limit: Option<usize>,
    limit_hit: bool,
}

/// Repeatedly rewrite `term` with `rule` until no rewrite applies.
///
/// A term the rule cannot rewrite is its own fixpoint, reached in zero
/// steps.
pub fn reduce_to_fixpoint<'s>(session: &'s Session, rule: &Rule, term: TermId) -> Fixpoint<'s> {
    let mut expanded = HashSet::new();
    expanded.insert(term);
    Fixpoint {
        session,
        rule: rule.clone(),
        stack: vec![Frame {
            term,
            depth: 0,
            successors: walk(session, rule, term),
            moved: false,
        }],
        expanded,
        yielded: HashSet::new(),
        step_limit: None,
        limit_hit: false,
    }
}

/// Rewrite `term` once, at the first position where `rule` changes it.
pub fn apply_once(session: &Session, rule: &Rule, term: TermId) -> Result<TermId, RewriteError> {
    for next in walk(session, rule, term) {
        let next = next?;
        if next != term {
            return Ok(next);
        }
    }
    Err(RewriteError::PatternNotFound)
}

impl<'s> Fixpoint<'s> {
    /// Bound the number of rewrite steps along any one path. Paths cut by
    /// the limit yield nothing.
    pub fn with_step_limit(mut self, limit: Option<usize>) -> Self {
        self.step_limit = limit;
        self
    }

    /// The first fixpoint.
    pub fn once(mut self) -> Result<Reduction, RewriteError> {
        match self.next() {
            Some(result) => result,
            None => Err(self.exhausted()),
        }
    }

    /// Every distinct fixpoint, up to `max` of them.
    pub fn all(self, max: Option<usize>) -> Result<Vec<Reduction>, RewriteError> {
        let limit = self.step_limit;
        let mut out = Vec::new();
        let mut cut = false;
        let mut iter = self;
        while max.map_or(true, |m| out.len() < m) {
            match iter.next() {
                Some(result) => out.push(result?),
                None => {
                    cut = iter.limit_hit;
                    break;
                }
            }
        }
        if out.is_empty() && cut {
            return Err(RewriteError::StepLimitExceeded {
                limit: limit.unwrap_or(0),
            });
        }
        Ok(out)
    }

    /// Whether some path has been cut by the step limit so far.
    pub fn limit_hit(&self) -> bool {
        self.limit_hit
    }

    fn exhausted(&self) -> RewriteError {
        match (self.limit_hit, self.step_limit) {
            (true, Some(limit)) => RewriteError::StepLimitExceeded { limit },
            _ => RewriteError::PatternNotFound,
        }
    }
}

impl<'s> Iterator for Fixpoint<'s> {
    type Item = Result<Reduction, RewriteError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (current, depth, successor) = match self.stack.last_mut() {
                None => return None,
                Some(frame) => (frame.term, frame.depth, frame.successors.next()),
            };

            match successor {
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(next)) if next == current => continue,
                Some(Ok(next)) => {
                    if let Some(frame) = self.stack.last_mut() {
                        frame.moved = true;
                    }
                    let depth = depth + 1;
                    if let Some(limit) = self.step_limit {
                        if depth > limit {
                            if !self.limit_hit {
                                warn!(limit, rule = self.rule.name(), "fixpoint_step_limit");
                            }
                            self.limit_hit = true;
                            continue;
                        }
                    }
                    if !self.expanded.insert(next) {
                        trace!(?next, "fixpoint_already_expanded");
                        continue;
                    }
                    self.session.metrics().record_fixpoint_step();
                    debug!(depth, term = ?next, "fixpoint_step");
                    let successors = walk(self.session, &self.rule, next);
                    self.stack.push(Frame {
                        term: next,
                        depth,
                        successors,
                        moved: false,
                    });
                }
                None => {
                    let frame = self.stack.pop()?;
                    if !frame.moved && self.yielded.insert(frame.term) {
                        self.session.metrics().record_fixpoint();
                        debug!(steps = frame.depth, "fixpoint_reached");
                        return Some(Ok(Reduction {
                            term: frame.term,
                            steps: frame.depth,
                        }));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/fixpoint.rs"]
mod tests;
