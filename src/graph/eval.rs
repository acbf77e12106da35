use super::{Graph, Op};
use crate::error::GraphError;
use crate::tensor::Tensor;

impl Graph {
    /// Evaluate the graph on named input values.
    ///
    /// Every op is computed in f64 and the result rounded to the node's
    /// dtype, so an `f32` graph loses precision where real `f32` arithmetic
    /// would.
    pub fn eval(&self, feeds: &[(&str, Tensor)]) -> Result<Vec<Tensor>, GraphError> {
        let mut values: Vec<Tensor> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let arg = |k: usize| -> Result<&Tensor, GraphError> {
                let id = node.inputs.get(k).ok_or(GraphError::Arity {
                    op: node.op.name().to_string(),
                    expected: node.op.arity(),
                    found: node.inputs.len(),
                })?;
                values
                    .get(id.index())
                    .ok_or(GraphError::UnknownNode { index: id.0 })
            };
            let binary = |f: fn(f64, f64) -> f64| -> Result<Tensor, GraphError> {
                let (lhs, rhs) = (arg(0)?, arg(1)?);
                lhs.zip_with(rhs, f).ok_or_else(|| GraphError::ShapeMismatch {
                    op: node.op.name().to_string(),
                    lhs: lhs.shape.to_string(),
                    rhs: rhs.shape.to_string(),
                })
            };

            let value = match &node.op {
                Op::Placeholder { name } => {
                    let fed = feeds
                        .iter()
                        .find(|(n, _)| *n == name.as_str())
                        .map(|(_, t)| t)
                        .ok_or_else(|| GraphError::MissingFeed { name: name.clone() })?;
                    if fed.shape != node.shape {
                        return Err(GraphError::FeedShape {
                            name: name.clone(),
                            expected: node.shape.to_string(),
                            found: fed.shape.to_string(),
                        });
                    }
                    fed.clone()
                }
                Op::Const { value } => value.clone(),
                Op::Add => binary(|a, b| a + b)?,
                Op::Sub => binary(|a, b| a - b)?,
                Op::Mul => binary(|a, b| a * b)?,
                Op::Div => binary(|a, b| a / b)?,
                Op::Pow => binary(f64::powf)?,
                Op::Neg => arg(0)?.map(|v| -v),
                Op::Square => arg(0)?.map(|v| v * v),
                Op::Sqrt => arg(0)?.map(f64::sqrt),
                Op::Exp => arg(0)?.map(f64::exp),
                Op::Log => arg(0)?.map(f64::ln),
                Op::Sum => arg(0)?.sum(),
            };
            let dtype = node.dtype;
            values.push(value.map(|v| dtype.round(v)));
        }

        self.outputs
            .iter()
            .map(|id| {
                values
                    .get(id.index())
                    .cloned()
                    .ok_or(GraphError::UnknownNode { index: id.0 })
            })
            .collect()
    }
}
