use super::{broadcast_binary, reduce_grad_to_shape, Operation};
use crate::tensor::Tensor;
use ndarray::ArrayD;
use std::any::Any;

/// The addition operation.
pub struct Add;

impl Operation for Add {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        broadcast_binary(&a, &b, |x, y| x + y)
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a_shape = inputs[0].lock().data.shape().to_vec();
        let b_shape = inputs[1].lock().data.shape().to_vec();
        let grad_a = reduce_grad_to_shape(output_grad, &a_shape);
        let grad_b = reduce_grad_to_shape(output_grad, &b_shape);
        vec![grad_a, grad_b]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The subtraction operation.
pub struct Sub;

impl Operation for Sub {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        broadcast_binary(&a, &b, |x, y| x - y)
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a_shape = inputs[0].lock().data.shape().to_vec();
        let b_shape = inputs[1].lock().data.shape().to_vec();
        let grad_a = reduce_grad_to_shape(output_grad, &a_shape);
        let grad_b = reduce_grad_to_shape(&(-output_grad), &b_shape);
        vec![grad_a, grad_b]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The multiplication operation.
pub struct Mul;

impl Operation for Mul {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        broadcast_binary(&a, &b, |x, y| x * y)
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        let grad_a = broadcast_binary(&b, output_grad, |y, g| y * g);
        let grad_b = broadcast_binary(&a, output_grad, |x, g| x * g);
        vec![
            reduce_grad_to_shape(&grad_a, a.shape()),
            reduce_grad_to_shape(&grad_b, b.shape()),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The division operation.
pub struct Div;

impl Operation for Div {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        broadcast_binary(&a, &b, |x, y| x / y)
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a = inputs[0].lock().data.clone();
        let b = inputs[1].lock().data.clone();
        let grad_a = broadcast_binary(output_grad, &b, |g, y| g / y);
        // d/db (a / b) = -a / b^2
        let scaled = broadcast_binary(&a, output_grad, |x, g| x * g);
        let grad_b = broadcast_binary(&scaled, &b, |t, y| -t / (y * y));
        vec![
            reduce_grad_to_shape(&grad_a, a.shape()),
            reduce_grad_to_shape(&grad_b, b.shape()),
        ]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element-wise natural logarithm.
pub struct Log;

impl Operation for Log {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let a = &inputs[0].lock().data;
        a.mapv(|x| x.ln())
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let a = &inputs[0].lock().data;
        // d/dx ln(x) = 1/x
        vec![output_grad / a]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
