//! Portable text format for trained network parameters
//!
//! A weight file is a sequence of self-delimiting blocks, one per tensor:
//!
//! ```text
//! # common.0.weight
//! 2 3
//! 0.1 0.2 0.3
//! 0.4 0.5 0.6
//! # common.0.bias
//! 2
//! 0.01 -0.02
//! ```
//!
//! The header gives the tensor name, the next line its shape (`rows cols` for
//! matrices, `len` for vectors), followed by one data line per matrix row or a
//! single data line for a vector. Blocks appear in a fixed order agreed between
//! producer and consumer, described by a [`Topology`].

mod codec;
mod error;
pub mod storage;
mod tensor;
mod topology;

pub use codec::{read_tensors, read_tensors_with, write_tensors};
pub use error::{Result, WeightFileError};
pub use storage::{load_weights, save_weights};
pub use tensor::{NamedTensor, TensorData};
pub use topology::{TensorSpec, Topology};
