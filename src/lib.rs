//! This crate provides a tensor library with reverse-mode automatic differentiation.
//!
//! Tensors wrap [`ndarray::ArrayD`] and record the operations that produced them;
//! calling [`Tensor::backward`](tensor::Tensor::backward) propagates gradients back
//! through the recorded graph, accumulating into each participating tensor.
//!
//! The [`testing`] module exposes the proptest strategies used by the crate's own
//! property-based test suites.

pub mod error;
pub mod labels;
pub mod nn;
pub mod ops;
pub mod tensor;
pub mod testing;

pub use error::TensorError;
pub use labels::Labels;
pub use tensor::Tensor;
