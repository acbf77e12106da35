use crate::constraint::Disequality;
use crate::term::{Args, Term, TermId, TermStore};
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// A place where a rule fired: the matched term and its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    pub matched: TermId,
    pub replacement: TermId,
}

/// A substitution maps variable indices to terms.
///
/// Substitutions are persistent values: every extension returns a new
/// `Subst` and leaves the original untouched, so search branches can share
/// a common prefix and be discarded independently. The maps are behind
/// `Arc` and copied only when a shared map is extended.
///
/// Besides bindings a substitution carries the disequalities still waiting
/// to be decided and the log of rewrite sites recorded so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subst {
    bindings: Arc<HashMap<u32, TermId>>,
    constraints: Arc<Vec<Disequality>>,
    sites: Arc<Vec<Site>>,
}

impl Subst {
    /// Create an empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this substitution with one more binding.
    pub fn extend(&self, var: u32, term: TermId) -> Self {
        let mut next = self.clone();
        next.bind(var, term);
        next
    }

    /// Bind in place. Only called on substitutions owned by a single
    /// search branch.
    pub(crate) fn bind(&mut self, var: u32, term: TermId) {
        Arc::make_mut(&mut self.bindings).insert(var, term);
    }

    /// Get the binding for a variable, if any.
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    pub fn is_bound(&self, var: u32) -> bool {
        self.bindings.contains_key(&var)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Iterator over (var_index, term_id) pairs for bound variables.
    pub fn iter(&self) -> impl Iterator<Item = (u32, TermId)> + '_ {
        self.bindings.iter().map(|(v, t)| (*v, *t))
    }

    pub fn constraints(&self) -> &[Disequality] {
        &self.constraints
    }

    pub(crate) fn set_constraints(&mut self, constraints: Vec<Disequality>) {
        self.constraints = Arc::new(constraints);
    }

    pub(crate) fn push_constraint(&mut self, diseq: Disequality) {
        let list = Arc::make_mut(&mut self.constraints);
        if !list.contains(&diseq) {
            list.push(diseq);
        }
    }

    /// Rewrite sites recorded along this branch, oldest first.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub(crate) fn push_site(&mut self, site: Site) {
        Arc::make_mut(&mut self.sites).push(site);
    }

    /// Follow variable bindings until reaching an unbound variable or a
    /// non-variable term.
    pub fn deref(&self, term: TermId, terms: &TermStore) -> TermId {
        let mut current = term;
        let mut hops = 0usize;
        loop {
            match terms.resolve(current) {
                Some(Term::Var(idx)) => match self.get(idx) {
                    // Occurs check keeps chains acyclic; the hop bound only
                    // guards against substitutions built by hand.
                    Some(bound) if hops <= self.len() => {
                        current = bound;
                        hops += 1;
                    }
                    _ => return current,
                },
                _ => return current,
            }
        }
    }

    /// Replace every bound variable in `term` by its value, recursively.
    ///
    /// Unbound variables stay in place. Uses an explicit stack, so deep
    /// graphs do not grow the call stack.
    pub fn reify(&self, term: TermId, terms: &TermStore) -> TermId {
        let mut work_stack: Vec<(TermId, bool)> = vec![(term, false)];
        let mut result_stack: Vec<TermId> = Vec::new();

        while let Some((tid, children_done)) = work_stack.pop() {
            if children_done {
                if let Some(Term::App(func, children, attrs)) = terms.resolve(tid) {
                    let n = children.len();
                    let new_children: Args = result_stack.drain(result_stack.len() - n..).collect();
                    if new_children == children {
                        result_stack.push(tid);
                    } else {
                        result_stack.push(terms.app_with(func, new_children, attrs));
                    }
                }
                continue;
            }

            let resolved = self.deref(tid, terms);
            match terms.resolve(resolved) {
                Some(Term::App(_, children, _)) if !children.is_empty() => {
                    work_stack.push((resolved, true));
                    for child in children.iter().rev() {
                        work_stack.push((*child, false));
                    }
                }
                _ => result_stack.push(resolved),
            }
        }

        result_stack.pop().unwrap_or(term)
    }

    /// The first unbound variable reachable from `term`, if any.
    pub fn first_unbound(&self, term: TermId, terms: &TermStore) -> Option<u32> {
        let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
        stack.push(term);
        while let Some(t) = stack.pop() {
            match terms.resolve(self.deref(t, terms)) {
                Some(Term::Var(idx)) => return Some(idx),
                Some(Term::App(_, children, _)) => stack.extend(children.iter().rev().copied()),
                _ => {}
            }
        }
        None
    }

    /// True when `term` contains no unbound variables under this
    /// substitution.
    pub fn is_ground(&self, term: TermId, terms: &TermStore) -> bool {
        self.first_unbound(term, terms).is_none()
    }
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;
