use super::{permute_back, permute_to_last, Operation};
use crate::tensor::Tensor;
use ndarray::{ArrayD, Axis};
use std::any::Any;

fn softmax_lanes(mut a: ArrayD<f32>) -> ArrayD<f32> {
    let last_axis = a.ndim() - 1;
    for mut lane in a.lanes_mut(Axis(last_axis)) {
        let max = lane.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0f32;
        for v in lane.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in lane.iter_mut() {
            *v /= sum;
        }
    }
    a
}

/// Softmax operation (numerically stable), forward and backward on `axis`.
pub struct Softmax {
    pub axis: usize,
}

impl Softmax {
    pub fn new(axis: usize) -> Self {
        Softmax { axis }
    }

    fn resolve_axis(&self, ndim: usize) -> usize {
        if self.axis >= ndim {
            ndim - 1
        } else {
            self.axis
        }
    }
}

impl Operation for Softmax {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let x = &inputs[0].lock().data;
        let axis = self.resolve_axis(x.ndim());
        let (permuted, perm_opt) = permute_to_last(x, axis);
        let out = softmax_lanes(permuted);
        match perm_opt {
            Some(ref perm) => permute_back(out, perm),
            None => out,
        }
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let x = &inputs[0].lock().data;
        let axis = self.resolve_axis(x.ndim());
        let (permuted, perm_opt) = permute_to_last(x, axis);
        let y = softmax_lanes(permuted);
        let last_axis = y.ndim() - 1;
        // grad = y * (grad_out - sum(grad_out * y)) along the axis
        let (p_output_grad, _) = permute_to_last(output_grad, axis);
        let mut grad_in = p_output_grad.clone();
        for (mut g_lane, y_lane) in grad_in
            .lanes_mut(Axis(last_axis))
            .into_iter()
            .zip(y.lanes(Axis(last_axis)))
        {
            let mut s = 0.0f32;
            for (g, &yy) in g_lane.iter().zip(y_lane.iter()) {
                s += g * yy;
            }
            for (g, &yy) in g_lane.iter_mut().zip(y_lane.iter()) {
                *g = yy * (*g - s);
            }
        }
        match perm_opt {
            Some(ref perm) => vec![permute_back(grad_in, perm)],
            None => vec![grad_in],
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// LogSoftmax operation (stable): computes `log(softmax(x))` along `axis`.
pub struct LogSoftmax {
    pub axis: usize,
}

impl LogSoftmax {
    pub fn new(axis: usize) -> Self {
        LogSoftmax { axis }
    }

    fn resolve_axis(&self, ndim: usize) -> usize {
        if self.axis >= ndim {
            ndim - 1
        } else {
            self.axis
        }
    }
}

impl Operation for LogSoftmax {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let x = &inputs[0].lock().data;
        let axis = self.resolve_axis(x.ndim());
        // stable log-softmax: (x - max) - log(sum(exp(x - max)))
        let (mut out, perm_opt) = permute_to_last(x, axis);
        let last_axis = out.ndim() - 1;
        for mut lane in out.lanes_mut(Axis(last_axis)) {
            let max = lane.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for v in lane.iter() {
                sum += (*v - max).exp();
            }
            let logsum = sum.ln();
            for v in lane.iter_mut() {
                *v = (*v - max) - logsum;
            }
        }
        match perm_opt {
            Some(ref perm) => permute_back(out, perm),
            None => out,
        }
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let x = &inputs[0].lock().data;
        let axis = self.resolve_axis(x.ndim());
        let (permuted, perm_opt) = permute_to_last(x, axis);
        let y = softmax_lanes(permuted);
        let last_axis = y.ndim() - 1;
        // grad_input = grad_output - softmax * sum(grad_output) along axis
        let (p_output_grad, _) = permute_to_last(output_grad, axis);
        let mut grad_in = p_output_grad.clone();
        for (mut g_lane, y_lane) in grad_in
            .lanes_mut(Axis(last_axis))
            .into_iter()
            .zip(y.lanes(Axis(last_axis)))
        {
            let sum: f32 = g_lane.iter().sum();
            for (g, &yy) in g_lane.iter_mut().zip(y_lane.iter()) {
                *g -= yy * sum;
            }
        }
        match perm_opt {
            Some(ref perm) => vec![permute_back(grad_in, perm)],
            None => vec![grad_in],
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
