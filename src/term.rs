//! Term model: a hashconsed arena of logic variables, ground values and
//! operator applications.
//!
//! Every term lives in a [`TermStore`] and is addressed by a [`TermId`].
//! Structurally equal terms share one id, which is what preserves node
//! sharing when a DAG is converted into terms and back.

use crate::symbol::{FuncId, SymbolStore};
use crate::tensor::{DType, Shape, Tensor};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Unique identifier for a term in the term store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Operand list of a compound term.
pub type Args = SmallVec<[TermId; 4]>;

/// Optional metadata carried by a compound term.
///
/// `None` means "unspecified": pattern terms leave attributes empty so that
/// they match any concrete dtype, shape or output index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Attrs {
    pub dtype: Option<DType>,
    pub shape: Option<Shape>,
    pub output: Option<u32>,
}

impl Attrs {
    pub fn new(dtype: DType, shape: Shape, output: u32) -> Self {
        Self {
            dtype: Some(dtype),
            shape: Some(shape),
            output: Some(output),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dtype.is_none() && self.shape.is_none() && self.output.is_none()
    }

    /// Two attribute sets are compatible when every field is either equal or
    /// unspecified on one side.
    pub fn compatible(&self, other: &Attrs) -> bool {
        fn field<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            match (a, b) {
                (Some(x), Some(y)) => x == y,
                _ => true,
            }
        }
        field(&self.dtype, &other.dtype)
            && field(&self.shape, &other.shape)
            && field(&self.output, &other.output)
    }
}

/// A constant value.
///
/// Values are stored as canonical bit patterns so constants can be
/// hashconsed; `-0.0` is folded into `0.0` and every NaN into one NaN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constant {
    dtype: DType,
    shape: Shape,
    bits: Arc<[u64]>,
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

impl Constant {
    pub fn scalar(value: f64) -> Self {
        Self::from_tensor(&Tensor::scalar(value), DType::F64)
    }

    pub fn from_tensor(tensor: &Tensor, dtype: DType) -> Self {
        Self {
            dtype,
            shape: tensor.shape.clone(),
            bits: tensor.data.iter().map(|v| canonical_bits(*v)).collect(),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.bits.iter().map(|b| f64::from_bits(*b))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        if self.shape.is_scalar() {
            self.values().next()
        } else {
            None
        }
    }

    pub fn to_tensor(&self) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.values().collect(),
        }
    }

    /// Value equality: same shape and elementwise `==`. The dtype tag is
    /// not part of the comparison.
    pub fn value_eq(&self, other: &Constant) -> bool {
        self.shape == other.shape && self.values().zip(other.values()).all(|(a, b)| a == b)
    }
}

/// A ground leaf: a constant or a named input placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ground {
    Const(Constant),
    Input(FuncId),
}

impl Ground {
    pub fn value_eq(&self, other: &Ground) -> bool {
        match (self, other) {
            (Ground::Const(a), Ground::Const(b)) => a.value_eq(b),
            (Ground::Input(a), Ground::Input(b)) => a == b,
            _ => false,
        }
    }
}

/// A term is a logic variable, a ground leaf, or an operator applied to
/// operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A logic variable, identified by its index.
    Var(u32),
    /// A constant or an input placeholder.
    Ground(Ground),
    /// Operator tag, operands, attributes.
    App(FuncId, Args, Attrs),
}

/// Number of shards for hashcons maps (power of 2 for fast modulo).
const NUM_SHARDS: usize = 16;

/// Hashconsing term arena.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - TermId can be resolved back to the term
/// - Fresh variables never collide with variables handed out earlier
pub struct TermStore {
    /// Central storage of all terms, indexed by TermId.
    nodes: RwLock<Vec<Term>>,
    /// Sharded hashcons maps.
    shards: [RwLock<HashMap<Term, TermId>>; NUM_SHARDS],
    next_id: AtomicU32,
    /// Next variable index handed out by `fresh_var`.
    next_var: AtomicU32,
    /// Named variables are session-wide singletons.
    named: RwLock<HashMap<FuncId, u32>>,
}

impl TermStore {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| RwLock::new(HashMap::new()));
        Self {
            nodes: RwLock::new(Vec::new()),
            shards,
            next_id: AtomicU32::new(0),
            next_var: AtomicU32::new(0),
            named: RwLock::new(HashMap::new()),
        }
    }

    fn intern(&self, term: Term) -> TermId {
        let shard = &self.shards[Self::shard_index(&term)];

        {
            let map = shard.read();
            if let Some(&id) = map.get(&term) {
                return id;
            }
        }

        let mut map = shard.write();
        if let Some(&id) = map.get(&term) {
            return id;
        }

        let id = TermId(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut nodes = self.nodes.write();
            let idx = id.0 as usize;
            if nodes.len() <= idx {
                nodes.resize(idx + 1, Term::Var(u32::MAX));
            }
            nodes[idx] = term.clone();
        }
        map.insert(term, id);
        id
    }

    /// The variable with a given index. Later `fresh_var` calls never
    /// return this index.
    pub fn var(&self, index: u32) -> TermId {
        self.next_var
            .fetch_max(index.saturating_add(1), Ordering::Relaxed);
        self.intern(Term::Var(index))
    }

    /// A variable distinct from every variable created so far.
    pub fn fresh_var(&self) -> TermId {
        let index = self.next_var.fetch_add(1, Ordering::Relaxed);
        self.intern(Term::Var(index))
    }

    pub fn fresh_vars<const N: usize>(&self) -> [TermId; N] {
        std::array::from_fn(|_| self.fresh_var())
    }

    /// The variable registered under `name`, created on first use.
    pub fn named_var(&self, name: FuncId) -> TermId {
        if let Some(&index) = self.named.read().get(&name) {
            return self.intern(Term::Var(index));
        }
        let mut named = self.named.write();
        let index = *named
            .entry(name)
            .or_insert_with(|| self.next_var.fetch_add(1, Ordering::Relaxed));
        drop(named);
        self.intern(Term::Var(index))
    }

    pub fn constant(&self, value: Constant) -> TermId {
        self.intern(Term::Ground(Ground::Const(value)))
    }

    /// A f64 scalar constant.
    pub fn scalar(&self, value: f64) -> TermId {
        self.constant(Constant::scalar(value))
    }

    /// A named input placeholder.
    pub fn input(&self, name: FuncId) -> TermId {
        self.intern(Term::Ground(Ground::Input(name)))
    }

    /// An application with unspecified attributes.
    pub fn app(&self, func: FuncId, args: Args) -> TermId {
        self.intern(Term::App(func, args, Attrs::default()))
    }

    pub fn app_with(&self, func: FuncId, args: Args, attrs: Attrs) -> TermId {
        self.intern(Term::App(func, args, attrs))
    }

    pub fn app0(&self, func: FuncId) -> TermId {
        self.app(func, SmallVec::new())
    }

    pub fn app1(&self, func: FuncId, child: TermId) -> TermId {
        self.app(func, smallvec::smallvec![child])
    }

    pub fn app2(&self, func: FuncId, left: TermId, right: TermId) -> TermId {
        self.app(func, smallvec::smallvec![left, right])
    }

    /// Resolve a TermId to its term.
    pub fn resolve(&self, id: TermId) -> Option<Term> {
        let nodes = self.nodes.read();
        nodes.get(id.0 as usize).cloned()
    }

    pub fn is_var(&self, id: TermId) -> Option<u32> {
        match self.resolve(id)? {
            Term::Var(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn is_app(&self, id: TermId) -> Option<(FuncId, Args, Attrs)> {
        match self.resolve(id)? {
            Term::App(f, args, attrs) => Some((f, args, attrs)),
            _ => None,
        }
    }

    pub fn is_ground_leaf(&self, id: TermId) -> Option<Ground> {
        match self.resolve(id)? {
            Term::Ground(g) => Some(g),
            _ => None,
        }
    }

    /// Number of distinct terms interned so far.
    pub fn len(&self) -> usize {
        self.next_id.load(Ordering::Relaxed) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shard_index(term: &Term) -> usize {
        let mut hasher = FxHasher::default();
        term.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term in prefix notation, e.g. `(mul -0.5 (square x))`.
pub fn format_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
) -> Result<String, String> {
    fn render(
        term: TermId,
        terms: &TermStore,
        symbols: &SymbolStore,
        out: &mut String,
    ) -> Result<(), String> {
        match terms.resolve(term) {
            Some(Term::Var(idx)) => {
                out.push('$');
                out.push_str(&idx.to_string());
                Ok(())
            }
            Some(Term::Ground(Ground::Input(name))) => {
                let name = symbols
                    .resolve(name)
                    .ok_or_else(|| format!("Unknown symbol for input {:?}", name))?;
                out.push_str(name);
                Ok(())
            }
            Some(Term::Ground(Ground::Const(c))) => {
                match c.as_scalar() {
                    Some(v) => out.push_str(&v.to_string()),
                    None => {
                        out.push('[');
                        for (i, v) in c.values().enumerate() {
                            if i > 0 {
                                out.push(' ');
                            }
                            out.push_str(&v.to_string());
                        }
                        out.push(']');
                    }
                }
                Ok(())
            }
            Some(Term::App(func, children, _)) => {
                let name = symbols
                    .resolve(func)
                    .ok_or_else(|| format!("Unknown symbol for func id {:?}", func))?;
                if children.is_empty() {
                    out.push_str(name);
                    return Ok(());
                }
                out.push('(');
                out.push_str(name);
                for child in children.iter() {
                    out.push(' ');
                    render(*child, terms, symbols, out)?;
                }
                out.push(')');
                Ok(())
            }
            None => Err(format!("Unknown term id {:?}", term)),
        }
    }

    let mut out = String::new();
    render(term, terms, symbols, &mut out)?;
    Ok(out)
}

#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
