use ndarray::{Array1, Array2};

/// Values of a stored tensor
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// 2-D weight matrix, `[rows, cols]`
    Matrix(Array2<f32>),
    /// 1-D bias vector
    Vector(Array1<f32>),
}

impl TensorData {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            TensorData::Matrix(m) => m.shape().to_vec(),
            TensorData::Vector(v) => vec![v.len()],
        }
    }

    /// All values in row-major order
    pub fn to_vec(&self) -> Vec<f32> {
        match self {
            TensorData::Matrix(m) => m.iter().copied().collect(),
            TensorData::Vector(v) => v.to_vec(),
        }
    }
}

/// A tensor together with the name it is stored under
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    pub name: String,
    pub data: TensorData,
}

impl NamedTensor {
    pub fn matrix(name: impl Into<String>, values: Array2<f32>) -> Self {
        Self {
            name: name.into(),
            data: TensorData::Matrix(values),
        }
    }

    pub fn vector(name: impl Into<String>, values: Array1<f32>) -> Self {
        Self {
            name: name.into(),
            data: TensorData::Vector(values),
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        self.data.shape()
    }

    pub fn as_matrix(&self) -> Option<&Array2<f32>> {
        match &self.data {
            TensorData::Matrix(m) => Some(m),
            TensorData::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&Array1<f32>> {
        match &self.data {
            TensorData::Vector(v) => Some(v),
            TensorData::Matrix(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_shapes() {
        let m = NamedTensor::matrix("w", Array2::zeros((3, 5)));
        let v = NamedTensor::vector("b", array![1.0, 2.0]);
        assert_eq!(m.shape(), vec![3, 5]);
        assert_eq!(v.shape(), vec![2]);
        assert!(m.as_vector().is_none());
        assert!(v.as_matrix().is_none());
    }

    #[test]
    fn test_to_vec_row_major() {
        let m = NamedTensor::matrix("w", array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.data.to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }
}
