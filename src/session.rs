//! Session: the shared state of a rewriting run.
//!
//! A session owns the symbol table, the term arena, the algebraic facts and
//! the metrics. Goals and rules receive it by reference when they run, so
//! a rule value can be reused across sessions.

use crate::config::RewriteConfig;
use crate::facts::Facts;
use crate::metrics::RewriteMetrics;
use crate::symbol::{FuncId, SymbolStore};
use crate::term::{format_term, Args, Attrs, TermId, TermStore};

pub struct Session {
    symbols: SymbolStore,
    terms: TermStore,
    facts: Facts,
    metrics: RewriteMetrics,
}

impl Session {
    /// A session with the standard facts: `add` and `mul` are commutative
    /// and associative.
    pub fn new() -> Self {
        Self::from_config(&RewriteConfig::default())
    }

    /// A session with no algebraic facts declared.
    pub fn builder() -> SessionBuilder {
        SessionBuilder {
            symbols: SymbolStore::new(),
            facts: Facts::new(),
        }
    }

    pub fn from_config(config: &RewriteConfig) -> Self {
        let mut builder = Self::builder();
        for name in &config.commutative {
            builder = builder.commutative(name);
        }
        for name in &config.associative {
            builder = builder.associative(name);
        }
        builder.build()
    }

    pub fn symbols(&self) -> &SymbolStore {
        &self.symbols
    }

    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    pub fn metrics(&self) -> &RewriteMetrics {
        &self.metrics
    }

    pub fn sym(&self, name: &str) -> FuncId {
        self.symbols.intern(name)
    }

    /// Apply operator `name` with unspecified dtype and shape.
    pub fn op<const N: usize>(&self, name: &str, args: [TermId; N]) -> TermId {
        self.op_n(name, &args)
    }

    /// `name` is normalised like an exported node name; an output index
    /// written in it (`"scope/Split_1:1"`) is kept in the term's attrs.
    pub fn op_n(&self, name: &str, args: &[TermId]) -> TermId {
        let (tag, output) = self.symbols.intern_op(name);
        let attrs = Attrs {
            output,
            ..Attrs::default()
        };
        self.terms.app_with(tag, Args::from_slice(args), attrs)
    }

    pub fn scalar(&self, value: f64) -> TermId {
        self.terms.scalar(value)
    }

    pub fn input(&self, name: &str) -> TermId {
        self.terms.input(self.symbols.intern(name))
    }

    pub fn fresh(&self) -> TermId {
        self.terms.fresh_var()
    }

    pub fn fresh_vars<const N: usize>(&self) -> [TermId; N] {
        self.terms.fresh_vars()
    }

    /// The variable registered under `name`, created on first use.
    pub fn named(&self, name: &str) -> TermId {
        self.terms.named_var(self.symbols.intern(name))
    }

    /// Render a term for logs and test messages.
    pub fn format(&self, term: TermId) -> String {
        format_term(term, &self.terms, &self.symbols).unwrap_or_else(|e| format!("<{}>", e))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Declares the algebraic facts of a session.
pub struct SessionBuilder {
    symbols: SymbolStore,
    facts: Facts,
}

impl SessionBuilder {
    pub fn commutative(mut self, op: &str) -> Self {
        let (id, _) = self.symbols.intern_op(op);
        self.facts.declare_commutative(id);
        self
    }

    pub fn associative(mut self, op: &str) -> Self {
        let (id, _) = self.symbols.intern_op(op);
        self.facts.declare_associative(id);
        self
    }

    pub fn build(self) -> Session {
        Session {
            symbols: self.symbols,
            terms: TermStore::new(),
            facts: self.facts,
            metrics: RewriteMetrics::new(),
        }
    }
}
