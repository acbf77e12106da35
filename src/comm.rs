//! Matching modulo commutativity and associativity.
//!
//! `eq_comm` behaves like `eq` except that operands of operators declared
//! commutative may be paired in any order, and nested applications of an
//! associative operator are flattened first. Flattened chains of different
//! length are regrouped: an unbound variable may stand for several operands
//! of the longer chain. Such a variable is bound to the existing subterm
//! covering them when there is one, and to a new application otherwise.

use crate::goal::{conj, unify_stream, Goal};
use crate::session::Session;
use crate::stream::Stream;
use crate::subst::Subst;
use crate::symbol::FuncId;
use crate::term::{Args, Term, TermId, TermStore};
use crate::trace::trace;
use smallvec::SmallVec;

/// Unify `a` and `b` modulo the session's commutative and associative facts.
///
/// Alternative operand pairings are explored lazily, identity order first.
pub fn eq_comm(a: TermId, b: TermId) -> Goal {
    Goal::new(move |session, subst| match_comm(a, b, session, subst))
}

fn match_comm(a: TermId, b: TermId, session: &Session, subst: Subst) -> Stream {
    let terms = session.terms();
    let a = subst.deref(a, terms);
    let b = subst.deref(b, terms);
    if a == b {
        return Stream::unit(subst);
    }

    let (Some(Term::App(op_a, xs, attrs_a)), Some(Term::App(op_b, ys, attrs_b))) =
        (terms.resolve(a), terms.resolve(b))
    else {
        return unify_stream(a, b, session, subst);
    };
    if op_a != op_b || !attrs_a.compatible(&attrs_b) {
        session.metrics().record_unification_failure();
        return Stream::Empty;
    }

    let facts = session.facts();
    if !facts.is_commutative(op_a) {
        if xs.len() != ys.len() {
            session.metrics().record_unification_failure();
            return Stream::Empty;
        }
        return conj(xs.iter().zip(ys.iter()).map(|(x, y)| eq_comm(*x, *y))).apply(session, subst);
    }

    if facts.is_associative(op_a) {
        let flat_x = flatten(op_a, a, &subst, terms);
        let flat_y = flatten(op_a, b, &subst, terms);
        if flat_x.items.len() != flat_y.items.len() {
            trace!(
                lhs = flat_x.items.len(),
                rhs = flat_y.items.len(),
                "eq_comm_regroup"
            );
            return regroup(op_a, flat_x, flat_y, session, subst);
        }
        trace!(arity = flat_x.items.len(), "eq_comm_permute");
        return permuted(
            Permutations::new(flat_x.items.len()),
            flat_x.items,
            flat_y.items,
            subst,
        );
    }
    if xs.len() != ys.len() {
        session.metrics().record_unification_failure();
        return Stream::Empty;
    }
    trace!(arity = xs.len(), "eq_comm_permute");
    permuted(Permutations::new(xs.len()), xs, ys, subst)
}

/// Operands of a chain of one associative operator, left to right, with
/// the span of operands covered by every application in the chain.
struct Flat {
    items: Args,
    spans: Vec<(usize, usize, TermId)>,
}

impl Flat {
    /// The term standing for the operands at `members` (ascending): the
    /// operand itself, an application already in the chain covering exactly
    /// those operands, or else a new left-nested application.
    fn group(&self, op: FuncId, members: &[usize], terms: &TermStore) -> Option<TermId> {
        let (&first, &last) = (members.first()?, members.last()?);
        if members.len() == 1 {
            return self.items.get(first).copied();
        }
        if last + 1 - first == members.len() {
            if let Some((_, _, t)) = self
                .spans
                .iter()
                .find(|(start, end, _)| *start == first && *end == last + 1)
            {
                return Some(*t);
            }
        }
        let mut operands = members.iter().filter_map(|i| self.items.get(*i).copied());
        let head = operands.next()?;
        Some(operands.fold(head, |acc, t| terms.app2(op, acc, t)))
    }
}

/// Splice nested applications of `op` into one operand list.
fn flatten(op: FuncId, term: TermId, subst: &Subst, terms: &TermStore) -> Flat {
    enum Visit {
        Enter(TermId),
        Leave(TermId, usize),
    }
    let mut flat = Flat {
        items: Args::new(),
        spans: Vec::new(),
    };
    let mut stack = vec![Visit::Enter(term)];
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(t) => {
                let t = subst.deref(t, terms);
                match terms.resolve(t) {
                    Some(Term::App(f, args, _)) if f == op => {
                        stack.push(Visit::Leave(t, flat.items.len()));
                        stack.extend(args.iter().rev().map(|a| Visit::Enter(*a)));
                    }
                    _ => flat.items.push(t),
                }
            }
            Visit::Leave(t, start) => flat.spans.push((start, flat.items.len(), t)),
        }
    }
    flat
}

/// Chains of different length: split the longer one into as many groups
/// as the shorter one has operands and pair group `i` with operand `i`.
/// Only an unbound variable may take a group of several operands.
fn regroup(op: FuncId, x: Flat, y: Flat, session: &Session, subst: Subst) -> Stream {
    let terms = session.terms();
    let short_is_x = x.items.len() < y.items.len();
    let (short, long) = if short_is_x { (x, y) } else { (y, x) };
    let absorbs: SmallVec<[bool; 8]> = short
        .items
        .iter()
        .map(|t| terms.is_var(subst.deref(*t, terms)).is_some())
        .collect();
    if !absorbs.iter().any(|a| *a) {
        session.metrics().record_unification_failure();
        return Stream::Empty;
    }
    let groupings = Groupings::new(long.items.len(), absorbs);
    grouped(groupings, op, short.items, long, short_is_x, subst)
}

/// One branch per grouping, produced on demand.
fn grouped(
    mut groupings: Groupings,
    op: FuncId,
    short: Args,
    long: Flat,
    short_is_x: bool,
    subst: Subst,
) -> Stream {
    let Some(assignment) = groupings.next() else {
        return Stream::Empty;
    };
    Stream::lazy(move |session| {
        let terms = session.terms();
        let mut pairs = Vec::with_capacity(short.len());
        for (slot, operand) in short.iter().enumerate() {
            let members: SmallVec<[usize; 8]> = assignment
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == slot)
                .map(|(i, _)| i)
                .collect();
            let Some(group) = long.group(op, &members, terms) else {
                return Stream::Empty;
            };
            pairs.push(if short_is_x {
                eq_comm(*operand, group)
            } else {
                eq_comm(group, *operand)
            });
        }
        let here = conj(pairs).apply(session, subst.clone());
        let rest = Stream::lazy(move |_| grouped(groupings, op, short, long, short_is_x, subst));
        Stream::mplus(here, rest)
    })
}

/// One branch per operand ordering, produced on demand.
fn permuted(mut orders: Permutations, xs: Args, ys: Args, subst: Subst) -> Stream {
    let Some(order) = orders.next() else {
        return Stream::Empty;
    };
    Stream::lazy(move |session| {
        let pairing = conj(
            order
                .iter()
                .zip(ys.iter())
                .map(|(i, y)| eq_comm(xs[*i], *y)),
        );
        let here = pairing.apply(session, subst.clone());
        let rest = Stream::lazy(move |_| permuted(orders, xs, ys, subst));
        Stream::mplus(here, rest)
    })
}

/// Lexicographic permutations of `0..n`, starting from the identity.
struct Permutations {
    next: Option<SmallVec<[usize; 8]>>,
}

impl Permutations {
    fn new(n: usize) -> Self {
        Self {
            next: Some((0..n).collect()),
        }
    }
}

impl Iterator for Permutations {
    type Item = SmallVec<[usize; 8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        let n = succ.len();
        if n >= 2 {
            if let Some(i) = (0..n - 1).rev().find(|&i| succ[i] < succ[i + 1]) {
                if let Some(j) = (i + 1..n).rev().find(|&j| succ[j] > succ[i]) {
                    succ.swap(i, j);
                    succ[i + 1..].reverse();
                    self.next = Some(succ);
                }
            }
        }
        Some(current)
    }
}

/// Assignments of operands to slots in which every slot gets at least one
/// operand and only absorbing slots get more than one.
struct Groupings {
    absorbs: SmallVec<[bool; 8]>,
    next: Option<SmallVec<[usize; 8]>>,
}

impl Groupings {
    fn new(n: usize, absorbs: SmallVec<[bool; 8]>) -> Self {
        let next = if absorbs.is_empty() || n < absorbs.len() {
            None
        } else {
            Some(SmallVec::from_elem(0, n))
        };
        Self { absorbs, next }
    }

    fn admissible(&self, assignment: &[usize]) -> bool {
        self.absorbs.iter().enumerate().all(|(slot, absorbs)| {
            let count = assignment.iter().filter(|s| **s == slot).count();
            count == 1 || (count > 1 && *absorbs)
        })
    }
}

impl Iterator for Groupings {
    type Item = SmallVec<[usize; 8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.absorbs.len();
        loop {
            let current = self.next.take()?;
            // Counter in base `slots`, first operand fastest.
            let mut succ = current.clone();
            for digit in succ.iter_mut() {
                *digit += 1;
                if *digit < slots {
                    self.next = Some(succ);
                    break;
                }
                *digit = 0;
            }
            if self.admissible(&current) {
                return Some(current);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/comm.rs"]
mod tests;
