use super::*;
use crate::adapter::graph_equal;
use crate::error::AdapterError;
use crate::graph::Op;
use crate::rules::{add_zero, identities, recenter_normal};
use crate::tensor::Tensor;
use crate::test_utils::{apply, hierarchical_normal, scalar_input};

fn eval_scalar(graph: &Graph, x: f64, tau: f64, y: f64) -> f64 {
    graph
        .eval(&[
            ("x", Tensor::scalar(x)),
            ("tau", Tensor::scalar(tau)),
            ("y", Tensor::scalar(y)),
        ])
        .unwrap()[0]
        .as_scalar()
        .unwrap()
}

#[test]
fn rewrite_recenters_hierarchy() {
    let rewriter = Rewriter::new(recenter_normal());
    let g = hierarchical_normal();
    let out = rewriter.rewrite(&g).unwrap();
    assert_eq!(out.steps, 1);
    assert_eq!(out.graph.contract(), g.contract());
    // Every operation changes: the prior collapses to square(x) and the
    // child and its ancestors are rebuilt around add(0, mul(tau, x)).
    assert_eq!(out.created_nodes, 8);
    assert_eq!(out.reused_nodes, 0);

    let (x, tau, y) = (0.3, 2.0, -1.0);
    let shifted = y - tau * x;
    let expected = -0.5 * (x * x + shifted * shifted);
    assert!((eval_scalar(&out.graph, x, tau, y) - expected).abs() < 1e-12);
}

#[test]
fn rewrite_without_match_returns_same_graph() {
    let rewriter = Rewriter::new(add_zero());
    let g = hierarchical_normal();
    let out = rewriter.rewrite(&g).unwrap();
    assert_eq!(out.steps, 0);
    assert_eq!(out.created_nodes, 0);
    assert!(graph_equal(&out.graph, &g, rewriter.session()));
}

#[test]
fn rewrite_once_needs_a_match() {
    let rewriter = Rewriter::new(add_zero());
    let g = hierarchical_normal();
    assert!(matches!(
        rewriter.rewrite_once(&g),
        Err(RewriteError::PatternNotFound)
    ));
}

#[test]
fn rewrite_once_takes_one_step() {
    let mut g = Graph::new();
    let x = scalar_input(&mut g, "x");
    let zero = g.scalar(0.0);
    let inner = apply(&mut g, Op::Add, &[x, zero]);
    let outer = apply(&mut g, Op::Add, &[inner, zero]);
    g.add_output(outer).unwrap();

    let rewriter = Rewriter::new(add_zero());
    let once = rewriter.rewrite_once(&g).unwrap();
    assert_eq!(once.steps, 1);
    assert_eq!(once.graph.len(), 3);

    let full = rewriter.rewrite(&g).unwrap();
    assert_eq!(full.steps, 2);
    assert_eq!(full.graph.len(), 1);
}

#[test]
fn rewrite_all_respects_max_results() {
    let mut g = Graph::new();
    let x = scalar_input(&mut g, "x");
    let one = g.scalar(1.0);
    let m = apply(&mut g, Op::Mul, &[x, one]);
    let n = apply(&mut g, Op::Neg, &[m]);
    let nn = apply(&mut g, Op::Neg, &[n]);
    g.add_output(nn).unwrap();

    let rewriter = Rewriter::new(identities());
    let all = rewriter.rewrite_all(&g).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].graph.len(), 1);

    let config = RewriteConfig::default().with_max_results(Some(0));
    let none = Rewriter::with_config(identities(), config).rewrite_all(&g).unwrap();
    assert!(none.is_empty());
}

#[test]
fn session_facts_follow_config() {
    let config = RewriteConfig {
        commutative: vec!["maximum".to_string()],
        associative: Vec::new(),
        ..RewriteConfig::default()
    };
    let rewriter = Rewriter::with_config(add_zero(), config);
    let facts = rewriter.session().facts();
    assert!(facts.is_commutative(rewriter.session().sym("maximum")));
    assert!(!facts.is_commutative(rewriter.session().sym("add")));
}

#[test]
fn commuted_operands_are_matched() {
    let mut g = Graph::new();
    let x = scalar_input(&mut g, "x");
    let zero = g.scalar(0.0);
    let sum = apply(&mut g, Op::Add, &[zero, x]);
    g.add_output(sum).unwrap();

    let out = Rewriter::new(add_zero()).rewrite(&g).unwrap();
    assert_eq!(out.steps, 1);
    assert_eq!(out.graph.outputs(), &[crate::graph::NodeId(0)]);
}

#[test]
fn rewritten_term_with_free_variable_is_an_adapter_error() {
    use crate::rules::Rule;
    let leak = Rule::pattern("leak", |s, _| {
        let x = s.fresh();
        let free = s.fresh();
        (s.op("neg", [x]), s.op("add", [x, free]))
    });
    let mut g = Graph::new();
    let x = scalar_input(&mut g, "x");
    let n = apply(&mut g, Op::Neg, &[x]);
    g.add_output(n).unwrap();

    let result = Rewriter::new(leak).rewrite(&g);
    assert!(matches!(
        result,
        Err(RewriteError::Adapter(AdapterError::UnresolvedVariable { .. }))
    ));
}
