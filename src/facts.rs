use crate::symbol::FuncId;
use hashbrown::HashSet;

/// Algebraic facts about operators.
///
/// An operator declared commutative may have its operands matched in any
/// order; one declared associative may have nested applications flattened
/// before matching. The set is fixed once a session is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facts {
    commutative: HashSet<FuncId>,
    associative: HashSet<FuncId>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn declare_commutative(&mut self, op: FuncId) {
        self.commutative.insert(op);
    }

    pub(crate) fn declare_associative(&mut self, op: FuncId) {
        self.associative.insert(op);
    }

    pub fn is_commutative(&self, op: FuncId) -> bool {
        self.commutative.contains(&op)
    }

    pub fn is_associative(&self, op: FuncId) -> bool {
        self.associative.contains(&op)
    }

    pub fn is_empty(&self) -> bool {
        self.commutative.is_empty() && self.associative.is_empty()
    }
}
