//! Rewriter: run a rule over an external graph.
//!
//! The graph is converted to a term, reduced to a fixpoint and converted
//! back. `rewrite` returns the first fixpoint, `rewrite_all` enumerates the
//! distinct ones and `rewrite_once` performs a single step.

use crate::adapter::{from_term, to_term};
use crate::config::RewriteConfig;
use crate::error::RewriteError;
use crate::fixpoint::{apply_once, reduce_to_fixpoint, Reduction};
use crate::graph::Graph;
use crate::rules::Rule;
use crate::session::Session;
use crate::trace::{debug, info, info_span};

/// A rewritten graph and how it was obtained.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub graph: Graph,
    /// Rewrite steps from the input to this graph.
    pub steps: usize,
    /// Operation nodes carried over unchanged.
    pub reused_nodes: usize,
    /// Operation nodes introduced by the rewrite.
    pub created_nodes: usize,
}

pub struct Rewriter {
    session: Session,
    rule: Rule,
    config: RewriteConfig,
}

impl Rewriter {
    pub fn new(rule: Rule) -> Self {
        Self::with_config(rule, RewriteConfig::default())
    }

    pub fn with_config(rule: Rule, config: RewriteConfig) -> Self {
        Self {
            session: Session::from_config(&config),
            rule,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite to the first fixpoint.
    ///
    /// A graph the rule does not match comes back unchanged with zero steps.
    pub fn rewrite(&self, graph: &Graph) -> Result<Rewritten, RewriteError> {
        let _span = info_span!("rewrite", rule = self.rule.name()).entered();
        let source = to_term(graph, &self.session);
        let reduction = reduce_to_fixpoint(&self.session, &self.rule, source.root)
            .with_step_limit(self.config.step_limit)
            .once()?;
        let rewritten = self.reify(reduction, graph)?;
        info!(
            steps = rewritten.steps,
            reused = rewritten.reused_nodes,
            created = rewritten.created_nodes,
            "rewrite_done"
        );
        Ok(rewritten)
    }

    /// Every distinct fixpoint, up to `max_results` of them.
    pub fn rewrite_all(&self, graph: &Graph) -> Result<Vec<Rewritten>, RewriteError> {
        let _span = info_span!("rewrite_all", rule = self.rule.name()).entered();
        let source = to_term(graph, &self.session);
        let reductions = reduce_to_fixpoint(&self.session, &self.rule, source.root)
            .with_step_limit(self.config.step_limit)
            .all(self.config.max_results)?;
        info!(fixpoints = reductions.len(), "rewrite_all_done");
        reductions
            .into_iter()
            .map(|reduction| self.reify(reduction, graph))
            .collect()
    }

    /// Apply the rule at exactly one position.
    pub fn rewrite_once(&self, graph: &Graph) -> Result<Rewritten, RewriteError> {
        let source = to_term(graph, &self.session);
        let term = apply_once(&self.session, &self.rule, source.root)?;
        self.reify(Reduction { term, steps: 1 }, graph)
    }

    fn reify(&self, reduction: Reduction, original: &Graph) -> Result<Rewritten, RewriteError> {
        debug!(term = %self.session.format(reduction.term), "reify");
        let reified = from_term(reduction.term, original, &self.session)?;
        Ok(Rewritten {
            graph: reified.graph,
            steps: reduction.steps,
            reused_nodes: reified.reused,
            created_nodes: reified.created,
        })
    }
}

#[cfg(test)]
#[path = "tests/engine.rs"]
mod tests;
