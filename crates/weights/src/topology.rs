use crate::error::{Result, WeightFileError};
use crate::tensor::NamedTensor;

/// Expected name and shape of one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: String,
    pub shape: Vec<usize>,
}

impl TensorSpec {
    pub fn matrix(name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            name: name.into(),
            shape: vec![rows, cols],
        }
    }

    pub fn vector(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            shape: vec![len],
        }
    }
}

/// Ordered list of blocks a model expects in its weight file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    specs: Vec<TensorSpec>,
}

impl Topology {
    pub fn new(specs: Vec<TensorSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[TensorSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Check block count, order, names and shapes
    pub fn check(&self, tensors: &[NamedTensor]) -> Result<()> {
        for (i, spec) in self.specs.iter().enumerate() {
            let Some(tensor) = tensors.get(i) else {
                return Err(WeightFileError::topology(
                    &spec.name,
                    format!(
                        "missing block: expected {} blocks, found {}",
                        self.specs.len(),
                        tensors.len()
                    ),
                ));
            };
            if tensor.name != spec.name {
                return Err(WeightFileError::topology(
                    &tensor.name,
                    format!("expected block `{}` at position {}", spec.name, i),
                ));
            }
            if tensor.shape() != spec.shape {
                return Err(WeightFileError::topology(
                    &tensor.name,
                    format!(
                        "expected shape {:?}, found {:?}",
                        spec.shape,
                        tensor.shape()
                    ),
                ));
            }
        }

        if let Some(extra) = tensors.get(self.specs.len()) {
            return Err(WeightFileError::topology(
                &extra.name,
                format!(
                    "unexpected block: expected {} blocks, found {}",
                    self.specs.len(),
                    tensors.len()
                ),
            ));
        }

        Ok(())
    }
}
