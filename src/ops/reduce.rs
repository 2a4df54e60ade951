use super::Operation;
use crate::tensor::Tensor;
use ndarray::{ArrayD, IxDyn};
use std::any::Any;

/// Sum operation: sums all elements to a scalar.
pub struct Sum;

impl Operation for Sum {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = &inputs[0].lock().data;
        ArrayD::from_elem(IxDyn(&[]), a.sum())
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a_shape = inputs[0].lock().data.shape().to_vec();
        // output_grad is scalar; expand it over the input shape
        let val = *output_grad
            .iter()
            .next()
            .expect("Sum backward expects a scalar output gradient");
        vec![ArrayD::from_elem(IxDyn(&a_shape), val)]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Mean operation: computes the mean over all elements to a scalar.
pub struct Mean;

impl Operation for Mean {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = &inputs[0].lock().data;
        ArrayD::from_elem(IxDyn(&[]), a.sum() / (a.len() as f32))
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a = &inputs[0].lock().data;
        let val = *output_grad
            .iter()
            .next()
            .expect("Mean backward expects a scalar output gradient");
        vec![ArrayD::from_elem(IxDyn(a.shape()), val / (a.len() as f32))]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
