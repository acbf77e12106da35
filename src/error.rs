//! Error types surfaced to callers.
//!
//! Unification failure never appears here: a failed match is an empty
//! solution stream and only drives backtracking.

use crate::term::TermId;
use std::fmt;

/// Failure of a rewriting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The rule matched nowhere (single-step mode), or the fixpoint stream
    /// produced no result.
    PatternNotFound,
    /// Every rewrite path was cut by the configured step limit before
    /// reaching a fixpoint.
    StepLimitExceeded { limit: usize },
    /// One matched node was given two different replacements within a
    /// single rewrite.
    ReificationInconsistency {
        node: TermId,
        first: TermId,
        second: TermId,
    },
    /// The rewritten term could not be turned back into a graph.
    Adapter(AdapterError),
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::PatternNotFound => write!(f, "no rewrite rule matched"),
            RewriteError::StepLimitExceeded { limit } => {
                write!(f, "no fixpoint reached within {} rewrite steps", limit)
            }
            RewriteError::ReificationInconsistency {
                node,
                first,
                second,
            } => write!(
                f,
                "term {} has conflicting replacements {} and {}",
                node.raw(),
                first.raw(),
                second.raw()
            ),
            RewriteError::Adapter(e) => write!(f, "adapter error: {}", e),
        }
    }
}

impl std::error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RewriteError::Adapter(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdapterError> for RewriteError {
    fn from(e: AdapterError) -> Self {
        RewriteError::Adapter(e)
    }
}

/// Failure converting between terms and external graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The term still contains an unbound logic variable.
    UnresolvedVariable { var: u32 },
    /// An operator tag with no graph counterpart.
    UnknownOperator { name: String },
    /// An input placeholder the original graph does not declare.
    UnknownInput { name: String },
    ArityMismatch {
        op: String,
        expected: usize,
        found: usize,
    },
    /// Attributes on the term disagree with what the graph infers.
    AttributeMismatch { op: String, detail: String },
    /// Graph nodes produce a single value; other output indices are invalid.
    UnsupportedOutput { op: String, index: u32 },
    /// The root term is not the output bundle produced by `to_term`.
    MalformedRoot,
    /// The rebuilt graph does not expose the original input/output contract.
    ContractMismatch { detail: String },
    Graph(GraphError),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::UnresolvedVariable { var } => {
                write!(f, "term contains unresolved logic variable ${}", var)
            }
            AdapterError::UnknownOperator { name } => write!(f, "unknown operator '{}'", name),
            AdapterError::UnknownInput { name } => {
                write!(f, "input '{}' is not a placeholder of the original graph", name)
            }
            AdapterError::ArityMismatch {
                op,
                expected,
                found,
            } => write!(
                f,
                "operator '{}' takes {} operands, found {}",
                op, expected, found
            ),
            AdapterError::AttributeMismatch { op, detail } => {
                write!(f, "attributes of '{}' do not match: {}", op, detail)
            }
            AdapterError::UnsupportedOutput { op, index } => {
                write!(f, "operator '{}' has no output {}", op, index)
            }
            AdapterError::MalformedRoot => write!(f, "root term is not a graph output bundle"),
            AdapterError::ContractMismatch { detail } => {
                write!(f, "graph contract changed: {}", detail)
            }
            AdapterError::Graph(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AdapterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdapterError::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for AdapterError {
    fn from(e: GraphError) -> Self {
        AdapterError::Graph(e)
    }
}

/// Failure building, loading or evaluating an external graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    UnknownNode { index: u32 },
    Arity {
        op: String,
        expected: usize,
        found: usize,
    },
    ShapeMismatch { op: String, lhs: String, rhs: String },
    MissingFeed { name: String },
    FeedShape {
        name: String,
        expected: String,
        found: String,
    },
    UnknownOperator { name: String },
    /// A node refers to an input that is not defined before it.
    NotTopological { index: u32 },
    /// A tensor whose data does not fill its shape.
    ValueShape { shape: String, len: usize },
    /// A node whose declared dtype or shape differs from its value or from
    /// what its operands give.
    TypeMismatch { index: u32, detail: String },
    Json { message: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::UnknownNode { index } => write!(f, "unknown node %{}", index),
            GraphError::Arity {
                op,
                expected,
                found,
            } => write!(
                f,
                "operator '{}' takes {} inputs, found {}",
                op, expected, found
            ),
            GraphError::ShapeMismatch { op, lhs, rhs } => write!(
                f,
                "operator '{}' cannot broadcast shapes {} and {}",
                op, lhs, rhs
            ),
            GraphError::MissingFeed { name } => write!(f, "no value fed for input '{}'", name),
            GraphError::FeedShape {
                name,
                expected,
                found,
            } => write!(
                f,
                "input '{}' expects shape {}, got {}",
                name, expected, found
            ),
            GraphError::UnknownOperator { name } => write!(f, "unknown operator '{}'", name),
            GraphError::NotTopological { index } => {
                write!(f, "node %{} uses an input defined after it", index)
            }
            GraphError::ValueShape { shape, len } => {
                write!(f, "tensor of shape {} holds {} values", shape, len)
            }
            GraphError::TypeMismatch { index, detail } => {
                write!(f, "node %{} is mistyped: {}", index, detail)
            }
            GraphError::Json { message } => write!(f, "invalid graph JSON: {}", message),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Json {
            message: e.to_string(),
        }
    }
}

/// Failure loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "invalid rewrite configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}
