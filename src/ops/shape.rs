use super::Operation;
use crate::tensor::Tensor;
use ndarray::{ArrayD, Axis, IxDyn};
use std::any::Any;

/// Reshape operation: changes tensor shape but keeps element order.
pub struct Reshape {
    pub shape: Vec<usize>,
}

impl Reshape {
    pub fn new(shape: Vec<usize>) -> Self {
        Reshape { shape }
    }
}

impl Operation for Reshape {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = &inputs[0].lock().data;
        a.to_shape(self.shape.clone())
            .expect("Reshape forward: shape validated by Tensor::reshape")
            .to_owned()
            .into_dyn()
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let in_shape = inputs[0].lock().data.shape().to_vec();
        let g = output_grad
            .to_shape(IxDyn(&in_shape))
            .expect("Reshape backward: element count is preserved")
            .to_owned();
        vec![g]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Repeat operation: repeats each entry (or each slice along `axis`)
/// `repeats` times consecutively.
///
/// With `axis = None` the input is treated as flattened in logical
/// (row-major) order and the output is 1-D. The backward pass views the
/// output gradient as windows of `repeats` consecutive entries along the
/// repeated axis; summing each window accumulates the gradient onto the
/// source entry that produced it.
pub struct Repeat {
    pub repeats: usize,
    /// Already normalized to `[0, ndim)` by `Tensor::repeat`.
    pub axis: Option<usize>,
}

impl Repeat {
    pub fn new(repeats: usize, axis: Option<usize>) -> Self {
        Repeat { repeats, axis }
    }
}

impl Operation for Repeat {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = &inputs[0].lock().data;
        if self.repeats == 0 {
            return match self.axis {
                Some(axis) => {
                    let mut shape = a.shape().to_vec();
                    shape[axis] = 0;
                    ArrayD::zeros(IxDyn(&shape))
                }
                None => ArrayD::zeros(IxDyn(&[0])),
            };
        }
        match self.axis {
            Some(axis) => {
                let n = a.shape()[axis];
                let indices: Vec<usize> = (0..n)
                    .flat_map(|i| std::iter::repeat(i).take(self.repeats))
                    .collect();
                a.select(Axis(axis), &indices)
            }
            None => {
                let flat: Vec<f32> = a
                    .iter()
                    .flat_map(|&v| std::iter::repeat(v).take(self.repeats))
                    .collect();
                ArrayD::from_shape_vec(IxDyn(&[a.len() * self.repeats]), flat)
                    .expect("flat repeat length is len * repeats")
            }
        }
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a = &inputs[0].lock().data;
        if self.repeats == 0 {
            // Nothing in the output came from the input.
            return vec![ArrayD::zeros(a.dim())];
        }
        match self.axis {
            Some(axis) => {
                // Split the repeated axis into (n, repeats) windows and sum
                // over the window axis.
                let mut grouped = a.shape().to_vec();
                grouped.insert(axis + 1, self.repeats);
                let og = output_grad.as_standard_layout();
                let grad = og
                    .to_shape(IxDyn(&grouped))
                    .expect("Repeat backward: repeated axis has size n * repeats")
                    .sum_axis(Axis(axis + 1));
                vec![grad]
            }
            None => {
                let og = output_grad.as_standard_layout();
                let summed = og
                    .to_shape((a.len(), self.repeats))
                    .expect("Repeat backward: flat gradient has size len * repeats")
                    .sum_axis(Axis(1));
                let grad = summed
                    .into_dyn()
                    .to_shape(IxDyn(a.shape()))
                    .expect("Repeat backward: summed gradient matches input size")
                    .to_owned();
                vec![grad]
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
