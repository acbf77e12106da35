//! External computation graphs.
//!
//! A [`Graph`] is a DAG of tensor operations in topological order. Nodes
//! refer to their inputs by [`NodeId`], placeholders are the graph inputs
//! and a list of node ids are its outputs. Graphs are what the adapter
//! converts to terms and back, and what the evaluator runs.

mod eval;

use crate::error::GraphError;
use crate::symbol::normalize_op_name;
use crate::tensor::{DType, Shape, Tensor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Graph operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    Placeholder { name: String },
    Const { value: Tensor },
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Neg,
    Square,
    Sqrt,
    Exp,
    Log,
    Sum,
}

impl Op {
    /// Operator tag used for this op in terms.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Placeholder { .. } => "placeholder",
            Op::Const { .. } => "const",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Pow => "pow",
            Op::Neg => "neg",
            Op::Square => "square",
            Op::Sqrt => "sqrt",
            Op::Exp => "exp",
            Op::Log => "log",
            Op::Sum => "sum",
        }
    }

    /// Look up a computational op by name.
    ///
    /// Exported names are normalised first, so `"scope/AddV2_1:0"` is `add`.
    /// Leaves are never looked up by name.
    pub fn from_name(raw: &str) -> Option<Op> {
        let (name, _) = normalize_op_name(raw);
        let op = match name.as_str() {
            "add" | "addv2" => Op::Add,
            "sub" | "subtract" => Op::Sub,
            "mul" | "multiply" => Op::Mul,
            "div" | "realdiv" | "truediv" => Op::Div,
            "pow" => Op::Pow,
            "neg" | "negative" => Op::Neg,
            "square" => Op::Square,
            "sqrt" => Op::Sqrt,
            "exp" => Op::Exp,
            "log" => Op::Log,
            "sum" => Op::Sum,
            _ => return None,
        };
        Some(op)
    }

    pub fn arity(&self) -> usize {
        match self {
            Op::Placeholder { .. } | Op::Const { .. } => 0,
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Pow => 2,
            Op::Neg | Op::Square | Op::Sqrt | Op::Exp | Op::Log | Op::Sum => 1,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.arity() == 0
    }

    /// Result dtype and shape of this op applied to the given operands.
    fn infer(&self, operands: &[(DType, &Shape)]) -> Result<(DType, Shape), GraphError> {
        if operands.len() != self.arity() {
            return Err(GraphError::Arity {
                op: self.name().to_string(),
                expected: self.arity(),
                found: operands.len(),
            });
        }
        match self {
            Op::Add | Op::Sub | Op::Mul | Op::Pow | Op::Div => {
                let (ld, ls) = operands[0];
                let (rd, rs) = operands[1];
                let shape = ls.broadcast(rs).ok_or_else(|| GraphError::ShapeMismatch {
                    op: self.name().to_string(),
                    lhs: ls.to_string(),
                    rhs: rs.to_string(),
                })?;
                let mut dtype = ld.promote(rd);
                if matches!(self, Op::Div) && !dtype.is_float() {
                    dtype = DType::F64;
                }
                Ok((dtype, shape))
            }
            Op::Neg | Op::Square => Ok((operands[0].0, operands[0].1.clone())),
            Op::Sqrt | Op::Exp | Op::Log => {
                let (dtype, shape) = operands[0];
                let dtype = if dtype.is_float() { dtype } else { DType::F64 };
                Ok((dtype, shape.clone()))
            }
            Op::Sum => Ok((operands[0].0, Shape::scalar())),
            Op::Placeholder { .. } | Op::Const { .. } => Err(GraphError::UnknownOperator {
                name: self.name().to_string(),
            }),
        }
    }
}

/// One node of a graph: an op, its inputs and its static type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub op: Op,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<NodeId>,
    pub dtype: DType,
    #[serde(default)]
    pub shape: Shape,
}

/// The input and output signature of a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub inputs: Vec<(String, DType, Shape)>,
    pub outputs: Vec<(DType, Shape)>,
}

/// A computation graph in topological order.
///
/// Every way of obtaining a `Graph` keeps it valid: the builder infers
/// types, and deserialisation runs [`Graph::validate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawGraph")]
pub struct Graph {
    nodes: Vec<Node>,
    outputs: Vec<NodeId>,
}

#[derive(Deserialize)]
struct RawGraph {
    nodes: Vec<Node>,
    outputs: Vec<NodeId>,
}

impl TryFrom<RawGraph> for Graph {
    type Error = GraphError;

    fn try_from(raw: RawGraph) -> Result<Self, Self::Error> {
        let graph = Graph {
            nodes: raw.nodes,
            outputs: raw.outputs,
        };
        graph.validate()?;
        Ok(graph)
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from JSON and validate it.
    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        let raw: RawGraph = serde_json::from_str(text)?;
        Graph::try_from(raw)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check topological order, operand counts, output references, and
    /// that every declared dtype and shape agrees with the node's value or
    /// with what its operands give.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (i, node) in self.nodes.iter().enumerate() {
            let index = i as u32;
            if node.inputs.len() != node.op.arity() {
                return Err(GraphError::Arity {
                    op: node.op.name().to_string(),
                    expected: node.op.arity(),
                    found: node.inputs.len(),
                });
            }
            if node.inputs.iter().any(|input| input.index() >= i) {
                return Err(GraphError::NotTopological { index });
            }
            match &node.op {
                Op::Const { value } => {
                    value.check()?;
                    if value.shape != node.shape {
                        return Err(GraphError::TypeMismatch {
                            index,
                            detail: format!(
                                "declared shape {} but value has shape {}",
                                node.shape, value.shape
                            ),
                        });
                    }
                }
                op if !op.is_leaf() => {
                    let operands: Vec<_> = node
                        .inputs
                        .iter()
                        .map(|id| (self.nodes[id.index()].dtype, &self.nodes[id.index()].shape))
                        .collect();
                    let (dtype, shape) = op.infer(&operands)?;
                    if dtype != node.dtype || shape != node.shape {
                        return Err(GraphError::TypeMismatch {
                            index,
                            detail: format!(
                                "declared {}{} but operands give {}{}",
                                node.dtype, node.shape, dtype, shape
                            ),
                        });
                    }
                }
                _ => {}
            }
        }
        for out in &self.outputs {
            if out.index() >= self.nodes.len() {
                return Err(GraphError::UnknownNode { index: out.0 });
            }
        }
        Ok(())
    }

    pub fn placeholder(&mut self, name: &str, dtype: DType, shape: Shape) -> NodeId {
        self.push(Node {
            op: Op::Placeholder {
                name: name.to_string(),
            },
            inputs: Vec::new(),
            dtype,
            shape,
        })
    }

    pub fn constant(&mut self, value: Tensor, dtype: DType) -> NodeId {
        let shape = value.shape.clone();
        self.push(Node {
            op: Op::Const { value },
            inputs: Vec::new(),
            dtype,
            shape,
        })
    }

    /// An `f64` scalar constant.
    pub fn scalar(&mut self, value: f64) -> NodeId {
        self.constant(Tensor::scalar(value), DType::F64)
    }

    /// Append an operation node, inferring its dtype and shape.
    pub fn apply(&mut self, op: Op, inputs: &[NodeId]) -> Result<NodeId, GraphError> {
        let mut operands = Vec::with_capacity(inputs.len());
        for id in inputs {
            let node = self.node(*id).ok_or(GraphError::UnknownNode { index: id.0 })?;
            operands.push((node.dtype, &node.shape));
        }
        let (dtype, shape) = op.infer(&operands)?;
        Ok(self.push(Node {
            op,
            inputs: inputs.to_vec(),
            dtype,
            shape,
        }))
    }

    /// Append a node as-is. Callers guarantee its inputs precede it.
    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn add_output(&mut self, id: NodeId) -> Result<(), GraphError> {
        if id.index() >= self.nodes.len() {
            return Err(GraphError::UnknownNode { index: id.0 });
        }
        self.outputs.push(id);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Placeholders in declaration order.
    pub fn placeholders(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.op, Op::Placeholder { .. }))
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    pub fn placeholder_by_name(&self, name: &str) -> Option<NodeId> {
        self.placeholders()
            .find(|(_, node)| matches!(&node.op, Op::Placeholder { name: n } if n == name))
            .map(|(id, _)| id)
    }

    pub fn contract(&self) -> Contract {
        let inputs = self
            .placeholders()
            .filter_map(|(_, node)| match &node.op {
                Op::Placeholder { name } => Some((name.clone(), node.dtype, node.shape.clone())),
                _ => None,
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .filter_map(|id| self.node(*id))
            .map(|node| (node.dtype, node.shape.clone()))
            .collect();
        Contract { inputs, outputs }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "%{} = ", i)?;
            match &node.op {
                Op::Placeholder { name } => write!(f, "placeholder {}", name)?,
                Op::Const { value } => match value.as_scalar() {
                    Some(v) => write!(f, "const {}", v)?,
                    None => write!(f, "const {:?}", value.data)?,
                },
                op => {
                    write!(f, "{}", op.name())?;
                    for input in &node.inputs {
                        write!(f, " {}", input)?;
                    }
                }
            }
            writeln!(f, " : {}{}", node.dtype, node.shape)?;
        }
        write!(f, "return")?;
        for out in &self.outputs {
            write!(f, " {}", out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/graph.rs"]
mod tests;
