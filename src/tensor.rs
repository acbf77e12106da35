//! Dense values shared by graph constants, term attributes and the evaluator.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Element type of a graph value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Bool,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Round a computed f64 to what this dtype can hold.
    pub fn round(self, value: f64) -> f64 {
        match self {
            DType::F64 => value,
            DType::F32 => value as f32 as f64,
            DType::I32 => (value.trunc() as i32) as f64,
            DType::I64 => (value.trunc() as i64) as f64,
            DType::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Common dtype of a binary operation (the wider of the two).
    pub fn promote(self, other: DType) -> DType {
        self.max(other)
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static shape of a value; an empty shape is a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(pub SmallVec<[usize; 4]>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(SmallVec::new())
    }

    pub fn new(dims: &[usize]) -> Self {
        Shape(SmallVec::from_slice(dims))
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }

    /// Numpy-style broadcast of two shapes, aligned on trailing dimensions.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        let rank = self.rank().max(other.rank());
        let mut dims: SmallVec<[usize; 4]> = SmallVec::with_capacity(rank);
        for i in 0..rank {
            let a = dim_from_end(self, rank - 1 - i);
            let b = dim_from_end(other, rank - 1 - i);
            let d = match (a, b) {
                (x, y) if x == y => x,
                (1, y) => y,
                (x, 1) => x,
                _ => return None,
            };
            dims.push(d);
        }
        Some(Shape(dims))
    }

    /// Row-major strides of this shape, with zero strides for dimensions
    /// that broadcast up to `target`.
    pub(crate) fn broadcast_strides(&self, target: &Shape) -> SmallVec<[usize; 4]> {
        let offset = target.rank() - self.rank();
        let mut strides: SmallVec<[usize; 4]> = SmallVec::from_elem(0, target.rank());
        let mut acc = 1;
        for i in (0..self.rank()).rev() {
            let d = self.0[i];
            strides[i + offset] = if d == 1 && target.0[i + offset] != 1 { 0 } else { acc };
            acc *= d;
        }
        strides
    }
}

fn dim_from_end(shape: &Shape, from_end: usize) -> usize {
    if from_end < shape.rank() {
        shape.0[shape.rank() - 1 - from_end]
    } else {
        1
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str("]")
    }
}

/// A dense row-major array of values, computed in f64.
///
/// Deserialisation rejects data that does not fill the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    pub shape: Shape,
    pub data: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTensor {
    shape: Shape,
    data: Vec<f64>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = GraphError;

    fn try_from(raw: RawTensor) -> Result<Self, Self::Error> {
        let tensor = Tensor {
            shape: raw.shape,
            data: raw.data,
        };
        tensor.check()?;
        Ok(tensor)
    }
}

impl Tensor {
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    /// Build a tensor; returns None when `data` does not fill `shape`.
    pub fn new(shape: Shape, data: Vec<f64>) -> Option<Self> {
        if shape.numel() == data.len() {
            Some(Self { shape, data })
        } else {
            None
        }
    }

    /// Err unless `data` fills `shape` exactly.
    pub fn check(&self) -> Result<(), GraphError> {
        if self.shape.numel() == self.data.len() {
            Ok(())
        } else {
            Err(GraphError::ValueShape {
                shape: self.shape.to_string(),
                len: self.data.len(),
            })
        }
    }

    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            shape: Shape::new(&[data.len()]),
            data,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        if self.data.len() == 1 {
            Some(self.data[0])
        } else {
            None
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Elementwise binary operation with broadcasting. None when the shapes
    /// do not broadcast or either tensor does not fill its shape.
    pub fn zip_with(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> Option<Tensor> {
        if self.check().is_err() || other.check().is_err() {
            return None;
        }
        let shape = self.shape.broadcast(&other.shape)?;
        let ls = self.shape.broadcast_strides(&shape);
        let rs = other.shape.broadcast_strides(&shape);
        let n = shape.numel();
        let mut data = Vec::with_capacity(n);
        let mut index: SmallVec<[usize; 4]> = SmallVec::from_elem(0, shape.rank());
        for _ in 0..n {
            let li: usize = index.iter().zip(&ls).map(|(i, s)| i * s).sum();
            let ri: usize = index.iter().zip(&rs).map(|(i, s)| i * s).sum();
            data.push(f(self.data[li], other.data[ri]));
            for axis in (0..shape.rank()).rev() {
                index[axis] += 1;
                if index[axis] < shape.0[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Some(Tensor { shape, data })
    }

    pub fn sum(&self) -> Tensor {
        Tensor::scalar(self.data.iter().sum())
    }
}
