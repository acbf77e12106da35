use crate::graph::{Graph, NodeId, Op};
use crate::session::Session;
use crate::symbol::SymbolStore;
use crate::tensor::{DType, Shape};
use crate::term::TermStore;

pub(crate) fn setup() -> Session {
    Session::new()
}

pub(crate) fn stores() -> (SymbolStore, TermStore) {
    (SymbolStore::new(), TermStore::new())
}

/// Scalar f64 placeholder.
pub(crate) fn scalar_input(graph: &mut Graph, name: &str) -> NodeId {
    graph.placeholder(name, DType::F64, Shape::scalar())
}

pub(crate) fn apply(graph: &mut Graph, op: Op, inputs: &[NodeId]) -> NodeId {
    graph.apply(op, inputs).expect("well-typed test graph")
}

/// The centred two-level normal log-density
/// `-0.5 * (((x - 0) / tau)^2 + ((y - x) / 1)^2)`.
pub(crate) fn hierarchical_normal() -> Graph {
    let mut g = Graph::new();
    let x = scalar_input(&mut g, "x");
    let tau = scalar_input(&mut g, "tau");
    let y = scalar_input(&mut g, "y");
    let zero = g.scalar(0.0);
    let one = g.scalar(1.0);
    let half = g.scalar(-0.5);

    let dx = apply(&mut g, Op::Sub, &[x, zero]);
    let zx = apply(&mut g, Op::Div, &[dx, tau]);
    let prior = apply(&mut g, Op::Square, &[zx]);

    let dy = apply(&mut g, Op::Sub, &[y, x]);
    let zy = apply(&mut g, Op::Div, &[dy, one]);
    let child = apply(&mut g, Op::Square, &[zy]);

    let total = apply(&mut g, Op::Add, &[prior, child]);
    let logp = apply(&mut g, Op::Mul, &[half, total]);
    g.add_output(logp).expect("output exists");
    g
}
