//! Conversion between external graphs and terms.
//!
//! `to_term` turns each graph node into a hashconsed term, so shared nodes
//! become one shared term. `from_term` rebuilds a graph from a rewritten
//! term, reusing the original node for every subterm that was not touched
//! and creating nodes only for new structure.

use crate::error::AdapterError;
use crate::graph::{Graph, Node, NodeId, Op};
use crate::session::Session;
use crate::subst::Subst;
use crate::symbol::{normalize_op_name, FuncId, OUTPUTS_TAG};
use crate::term::{Attrs, Constant, Ground, Term, TermId};
use crate::trace::debug;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A graph in term form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphTerm {
    /// `__outputs__(out_0, .., out_n)`
    pub root: TermId,
    node_terms: Vec<TermId>,
}

impl GraphTerm {
    /// The term for one node of the source graph.
    pub fn node_term(&self, id: NodeId) -> Option<TermId> {
        self.node_terms.get(id.index()).copied()
    }
}

/// Result of rebuilding a graph from a term.
#[derive(Debug, Clone)]
pub struct Reified {
    pub graph: Graph,
    /// Operation nodes carried over from the original graph.
    pub reused: usize,
    /// Operation nodes the rewrite introduced.
    pub created: usize,
}

/// Convert a graph to a term.
///
/// Placeholders become input leaves named after the placeholder, constants
/// become constant leaves, and every operation node becomes an application
/// tagged with the op name and carrying its dtype, shape and output index.
pub fn to_term(graph: &Graph, session: &Session) -> GraphTerm {
    let terms = session.terms();
    let symbols = session.symbols();
    let mut node_terms: Vec<TermId> = Vec::with_capacity(graph.len());
    for node in graph.nodes() {
        let term = match &node.op {
            Op::Placeholder { name } => terms.input(symbols.intern(name)),
            Op::Const { value } => terms.constant(Constant::from_tensor(value, node.dtype)),
            op => {
                // Node inputs always precede the node in a graph.
                let args = node.inputs.iter().map(|id| node_terms[id.index()]).collect();
                let attrs = Attrs::new(node.dtype, node.shape.clone(), 0);
                terms.app_with(symbols.intern(op.name()), args, attrs)
            }
        };
        node_terms.push(term);
    }
    let outputs = graph
        .outputs()
        .iter()
        .map(|id| node_terms[id.index()])
        .collect();
    let root = terms.app(symbols.intern(OUTPUTS_TAG), outputs);
    GraphTerm { root, node_terms }
}

/// Rebuild a graph from a term produced by rewriting `to_term(original)`.
///
/// The result declares the same placeholders in the same order and exposes
/// the same outputs with the same dtypes and shapes as `original`.
pub fn from_term(root: TermId, original: &Graph, session: &Session) -> Result<Reified, AdapterError> {
    let terms = session.terms();
    let symbols = session.symbols();

    if let Some(var) = Subst::new().first_unbound(root, terms) {
        return Err(AdapterError::UnresolvedVariable { var });
    }
    let (tag, outputs, _) = terms.is_app(root).ok_or(AdapterError::MalformedRoot)?;
    if symbols.get(OUTPUTS_TAG) != Some(tag) {
        return Err(AdapterError::MalformedRoot);
    }
    if outputs.len() != original.outputs().len() {
        return Err(AdapterError::ContractMismatch {
            detail: format!(
                "expected {} outputs, found {}",
                original.outputs().len(),
                outputs.len()
            ),
        });
    }

    let source = to_term(original, session);
    let mut origin: HashMap<TermId, NodeId> = HashMap::new();
    for (i, term) in source.node_terms.iter().enumerate() {
        origin.entry(*term).or_insert(NodeId(i as u32));
    }

    let mut rebuild = Rebuild {
        session,
        original,
        origin,
        graph: Graph::new(),
        memo: HashMap::new(),
        canon: HashMap::new(),
        reused: 0,
        created: 0,
    };
    for (id, node) in original.placeholders() {
        let new_id = rebuild.graph.push(node.clone());
        rebuild.memo.insert(source.node_terms[id.index()], new_id);
    }
    for out in outputs.iter() {
        let id = rebuild.build(*out)?;
        rebuild.graph.add_output(id)?;
    }

    let expected = original.contract();
    let found = rebuild.graph.contract();
    if expected != found {
        return Err(AdapterError::ContractMismatch {
            detail: format!("expected {:?}, found {:?}", expected, found),
        });
    }
    debug!(
        reused = rebuild.reused,
        created = rebuild.created,
        nodes = rebuild.graph.len(),
        "graph_rebuilt"
    );
    Ok(Reified {
        graph: rebuild.graph,
        reused: rebuild.reused,
        created: rebuild.created,
    })
}

/// Structural equality of two graphs: same placeholders, constants,
/// operations, attributes and sharing, regardless of node numbering.
pub fn graph_equal(a: &Graph, b: &Graph, session: &Session) -> bool {
    to_term(a, session).root == to_term(b, session).root
}

struct Rebuild<'a> {
    session: &'a Session,
    original: &'a Graph,
    /// First original node for each term of the source graph.
    origin: HashMap<TermId, NodeId>,
    graph: Graph,
    memo: HashMap<TermId, NodeId>,
    /// Structural identity of emitted operation nodes, so no two new nodes
    /// compute the same thing.
    canon: HashMap<(FuncId, SmallVec<[NodeId; 4]>), NodeId>,
    reused: usize,
    created: usize,
}

impl<'a> Rebuild<'a> {
    /// Emit the node for `root` and everything below it, children first.
    fn build(&mut self, root: TermId) -> Result<NodeId, AdapterError> {
        let terms = self.session.terms();
        let mut stack: Vec<(TermId, bool)> = vec![(root, false)];

        while let Some((term, ready)) = stack.pop() {
            if self.memo.contains_key(&term) {
                continue;
            }
            match terms.resolve(term) {
                Some(Term::Var(var)) => return Err(AdapterError::UnresolvedVariable { var }),
                Some(Term::Ground(Ground::Input(name))) => {
                    // Every known placeholder is already in the memo.
                    let name = self.session.symbols().resolve(name).unwrap_or("?");
                    return Err(AdapterError::UnknownInput {
                        name: name.to_string(),
                    });
                }
                Some(Term::Ground(Ground::Const(constant))) => {
                    let id = match self.origin.get(&term).and_then(|id| self.original.node(*id)) {
                        Some(node) => self.graph.push(node.clone()),
                        None => self.graph.constant(constant.to_tensor(), constant.dtype()),
                    };
                    self.memo.insert(term, id);
                }
                Some(Term::App(op, args, attrs)) => {
                    if !ready {
                        stack.push((term, true));
                        for arg in args.iter().rev() {
                            if !self.memo.contains_key(arg) {
                                stack.push((*arg, false));
                            }
                        }
                        continue;
                    }
                    let mut inputs: SmallVec<[NodeId; 4]> = SmallVec::with_capacity(args.len());
                    for arg in args.iter() {
                        inputs.push(*self.memo.get(arg).ok_or(AdapterError::MalformedRoot)?);
                    }
                    let id = self.emit(term, op, inputs, &attrs)?;
                    self.memo.insert(term, id);
                }
                None => return Err(AdapterError::MalformedRoot),
            }
        }

        self.memo.get(&root).copied().ok_or(AdapterError::MalformedRoot)
    }

    fn emit(
        &mut self,
        term: TermId,
        op: FuncId,
        inputs: SmallVec<[NodeId; 4]>,
        attrs: &Attrs,
    ) -> Result<NodeId, AdapterError> {
        let key = (op, inputs);
        if let Some(id) = self.canon.get(&key) {
            return Ok(*id);
        }
        let (op, inputs) = key;
        let name = self.session.symbols().resolve(op).unwrap_or("?").to_string();

        // A tag interned verbatim may still spell an output index.
        let (_, named_output) = normalize_op_name(&name);
        for index in [attrs.output, named_output].into_iter().flatten() {
            if index != 0 {
                return Err(AdapterError::UnsupportedOutput { op: name, index });
            }
        }

        let id = match self.origin.get(&term).and_then(|id| self.original.node(*id)) {
            Some(node) => {
                self.reused += 1;
                self.graph.push(Node {
                    op: node.op.clone(),
                    inputs: inputs.to_vec(),
                    dtype: node.dtype,
                    shape: node.shape.clone(),
                })
            }
            None => {
                let graph_op = Op::from_name(&name)
                    .ok_or_else(|| AdapterError::UnknownOperator { name: name.clone() })?;
                if graph_op.arity() != inputs.len() {
                    return Err(AdapterError::ArityMismatch {
                        op: name,
                        expected: graph_op.arity(),
                        found: inputs.len(),
                    });
                }
                let id = self.graph.apply(graph_op, &inputs)?;
                if let Some(node) = self.graph.node(id) {
                    check_attrs(&name, attrs, node)?;
                }
                self.created += 1;
                id
            }
        };
        self.canon.insert((op, inputs), id);
        Ok(id)
    }
}

/// Attributes recorded on a term must agree with what the graph infers.
fn check_attrs(op: &str, attrs: &Attrs, node: &Node) -> Result<(), AdapterError> {
    if let Some(dtype) = attrs.dtype {
        if dtype != node.dtype {
            return Err(AdapterError::AttributeMismatch {
                op: op.to_string(),
                detail: format!("dtype {} but operands give {}", dtype, node.dtype),
            });
        }
    }
    if let Some(shape) = &attrs.shape {
        if *shape != node.shape {
            return Err(AdapterError::AttributeMismatch {
                op: op.to_string(),
                detail: format!("shape {} but operands give {}", shape, node.shape),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/adapter.rs"]
mod tests;
