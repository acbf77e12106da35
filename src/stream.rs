//! Stream - lazy, pull-based solution streams.
//!
//! A goal applied to a substitution produces a `Stream`. Nothing is
//! computed until the stream is stepped; unconsumed branches are simply
//! dropped. `Any` interleaves its branches round-robin so an infinite
//! branch cannot starve the others.

use crate::goal::Goal;
use crate::session::Session;
use crate::subst::Subst;
use std::collections::VecDeque;
use std::fmt;

/// Search tree of pending solutions.
///
/// - `Empty`: no more answers
/// - `Emit(s, rest)`: an answer, then the rest
/// - `Any(branches)`: fair round-robin union
/// - `Bind(stream, goal)`: feed every answer of `stream` into `goal`
/// - `Apply(goal, s)`: a goal not yet applied
/// - `Lazy(thunk)`: a suspended computation
pub enum Stream {
    Empty,
    Emit(Subst, Box<Stream>),
    Any(VecDeque<Stream>),
    Bind(Box<Stream>, Goal),
    Apply(Goal, Subst),
    Lazy(Box<dyn FnOnce(&Session) -> Stream>),
}

impl Stream {
    /// A stream with exactly one answer.
    pub fn unit(subst: Subst) -> Self {
        Stream::Emit(subst, Box::new(Stream::Empty))
    }

    pub fn from_option(subst: Option<Subst>) -> Self {
        match subst {
            Some(s) => Stream::unit(s),
            None => Stream::Empty,
        }
    }

    pub fn lazy(thunk: impl FnOnce(&Session) -> Stream + 'static) -> Self {
        Stream::Lazy(Box::new(thunk))
    }

    /// Fair union of two streams.
    pub fn mplus(a: Stream, b: Stream) -> Self {
        match (a, b) {
            (Stream::Empty, b) => b,
            (a, Stream::Empty) => a,
            (a, b) => Stream::Any(VecDeque::from([a, b])),
        }
    }

    /// Fair union of any number of streams.
    pub fn any(branches: impl IntoIterator<Item = Stream>) -> Self {
        Self::from_branches(
            branches
                .into_iter()
                .filter(|b| !b.is_empty())
                .collect(),
        )
    }

    fn from_branches(mut branches: VecDeque<Stream>) -> Self {
        match branches.len() {
            0 => Stream::Empty,
            1 => branches.pop_front().unwrap_or(Stream::Empty),
            _ => Stream::Any(branches),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Stream::Empty)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Empty => write!(f, "Empty"),
            Stream::Emit(s, rest) => f.debug_tuple("Emit").field(s).field(rest).finish(),
            Stream::Any(branches) => f.debug_tuple("Any").field(branches).finish(),
            Stream::Bind(inner, goal) => f.debug_tuple("Bind").field(inner).field(goal).finish(),
            Stream::Apply(goal, s) => f.debug_tuple("Apply").field(goal).field(s).finish(),
            Stream::Lazy(_) => write!(f, "Lazy(..)"),
        }
    }
}

/// Result of stepping a stream one notch.
#[derive(Debug)]
pub enum Step {
    /// Produced an answer and the remaining stream.
    Emit(Subst, Stream),
    /// No answer yet, but the stream made progress.
    Continue(Stream),
    /// No more answers.
    Exhausted,
}

/// Step a stream once.
pub fn step(stream: Stream, session: &Session) -> Step {
    match stream {
        Stream::Empty => Step::Exhausted,

        Stream::Emit(subst, rest) => Step::Emit(subst, *rest),

        Stream::Any(mut branches) => {
            let Some(head) = branches.pop_front() else {
                return Step::Exhausted;
            };
            match step(head, session) {
                Step::Emit(subst, rest) => {
                    if !rest.is_empty() {
                        branches.push_back(rest);
                    }
                    Step::Emit(subst, Stream::from_branches(branches))
                }
                Step::Continue(rest) => {
                    branches.push_back(rest);
                    Step::Continue(Stream::Any(branches))
                }
                Step::Exhausted => Step::Continue(Stream::from_branches(branches)),
            }
        }

        Stream::Bind(inner, goal) => match step(*inner, session) {
            Step::Emit(subst, rest) => {
                let head = Stream::Apply(goal.clone(), subst);
                if rest.is_empty() {
                    Step::Continue(head)
                } else {
                    Step::Continue(Stream::mplus(head, Stream::Bind(Box::new(rest), goal)))
                }
            }
            Step::Continue(rest) => Step::Continue(Stream::Bind(Box::new(rest), goal)),
            Step::Exhausted => Step::Exhausted,
        },

        Stream::Apply(goal, subst) => Step::Continue(goal.apply(session, subst)),

        Stream::Lazy(thunk) => Step::Continue(thunk(session)),
    }
}

/// Iterator over the answers of a stream.
///
/// Pulls only as far as needed to produce the next answer.
pub struct Solutions<'s> {
    stream: Stream,
    session: &'s Session,
}

impl<'s> Solutions<'s> {
    pub fn new(stream: Stream, session: &'s Session) -> Self {
        Self { stream, session }
    }

    pub fn is_exhausted(&self) -> bool {
        self.stream.is_empty()
    }
}

impl<'s> Iterator for Solutions<'s> {
    type Item = Subst;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = std::mem::replace(&mut self.stream, Stream::Empty);
            self.session.metrics().record_step();
            match step(current, self.session) {
                Step::Emit(subst, rest) => {
                    self.stream = rest;
                    return Some(subst);
                }
                Step::Continue(rest) => self.stream = rest,
                Step::Exhausted => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/stream.rs"]
mod tests;
