use crate::error::TensorError;
use crate::tensor::Tensor;
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use std::any::Any;

pub mod arithmetic;
pub mod reduce;
pub mod shape;
pub mod softmax;

pub use arithmetic::{Add, Div, Log, Mul, Sub};
pub use reduce::{Mean, Sum};
pub use shape::{Repeat, Reshape};
pub use softmax::{LogSoftmax, Softmax};

/// A trait for operations that can be performed on tensors.
pub trait Operation: Send + Sync {
    /// Performs the forward pass of the operation, producing the output data.
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32>;

    /// Performs the backward pass, returning one gradient array per input.
    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>>;

    /// Returns the operation as a `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

/// Normalize a possibly-negative axis to `[0, ndim)`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize, TensorError> {
    let n = ndim as isize;
    let resolved = if axis < 0 { n + axis } else { axis };
    if resolved < 0 || resolved >= n {
        return Err(TensorError::AxisOutOfBounds { axis, ndim });
    }
    Ok(resolved as usize)
}

// Helper: compute the broadcast result shape of two operand shapes.
// Panics on incompatible shapes; callers construct operands through the
// tensor API, which only produces broadcastable pairs.
pub(crate) fn broadcast_shape(a: &[usize], b: &[usize]) -> Vec<usize> {
    let ndim = a.len().max(b.len());
    let mut result = vec![1usize; ndim];
    for shape in [a, b] {
        for (i, &dim) in shape.iter().rev().enumerate() {
            let ridx = ndim - 1 - i;
            let cur = result[ridx];
            if cur == 1 {
                result[ridx] = dim;
            } else if dim != 1 && dim != cur {
                panic!("operands could not be broadcast together: {:?} vs {:?}", a, b);
            }
        }
    }
    result
}

// Helper: apply `f` elementwise over two arrays broadcast to a common shape.
pub(crate) fn broadcast_binary<F>(a: &ArrayD<f32>, b: &ArrayD<f32>, f: F) -> ArrayD<f32>
where
    F: Fn(f32, f32) -> f32,
{
    let shape = broadcast_shape(a.shape(), b.shape());
    let a_view = a
        .broadcast(IxDyn(&shape))
        .expect("lhs broadcast checked by broadcast_shape");
    let b_view = b
        .broadcast(IxDyn(&shape))
        .expect("rhs broadcast checked by broadcast_shape");
    let mut out = ArrayD::zeros(IxDyn(&shape));
    Zip::from(&mut out)
        .and(&a_view)
        .and(&b_view)
        .for_each(|o, &x, &y| *o = f(x, y));
    out
}

// Helper: reduce `grad` to `target_shape` by summing over broadcasted axes.
pub(crate) fn reduce_grad_to_shape(grad: &ArrayD<f32>, target_shape: &[usize]) -> ArrayD<f32> {
    if grad.shape() == target_shape {
        return grad.clone();
    }

    let mut res = grad.clone();
    let target_ndim = target_shape.len();
    // Pad the target with leading ones so axes line up from the right.
    let dim_diff = res.ndim() as isize - target_ndim as isize;
    for axis in (0..res.ndim()).rev() {
        let target_dim = if axis as isize - dim_diff >= 0 {
            target_shape[(axis as isize - dim_diff) as usize]
        } else {
            1
        };
        if res.shape()[axis] != target_dim {
            res = res.sum_axis(Axis(axis));
        }
    }

    if res.shape() != target_shape {
        res = res
            .to_shape(IxDyn(target_shape))
            .expect("gradient reshape to input shape failed")
            .to_owned();
    }
    res
}

// Helper: permute axes so that `axis` becomes the last axis.
pub(crate) fn permute_to_last(a: &ArrayD<f32>, axis: usize) -> (ArrayD<f32>, Option<Vec<usize>>) {
    let ndim = a.ndim();
    if axis == ndim - 1 {
        return (a.clone(), None);
    }
    let mut perm: Vec<usize> = (0..ndim).collect();
    let axis_val = perm.remove(axis);
    perm.push(axis_val);
    let permuted = a.view().permuted_axes(perm.clone()).to_owned();
    (permuted, Some(perm))
}

pub(crate) fn permute_back(a: ArrayD<f32>, perm: &[usize]) -> ArrayD<f32> {
    let mut inv = vec![0usize; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inv[p] = i;
    }
    a.view().permuted_axes(inv).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_axis_resolves_negative() {
        assert_eq!(normalize_axis(-1, 3).unwrap(), 2);
        assert_eq!(normalize_axis(0, 3).unwrap(), 0);
        assert_eq!(normalize_axis(2, 3).unwrap(), 2);
    }

    #[test]
    fn normalize_axis_rejects_out_of_range() {
        assert!(matches!(
            normalize_axis(3, 3),
            Err(TensorError::AxisOutOfBounds { axis: 3, ndim: 3 })
        ));
        assert!(normalize_axis(-4, 3).is_err());
        assert!(normalize_axis(0, 0).is_err());
    }

    #[test]
    fn broadcast_shape_pads_from_the_right() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]), vec![2, 3]);
        assert_eq!(broadcast_shape(&[2, 1], &[1, 4]), vec![2, 4]);
        assert_eq!(broadcast_shape(&[], &[5]), vec![5]);
    }

    #[test]
    fn reduce_grad_sums_broadcast_axes() {
        let grad = ArrayD::from_elem(IxDyn(&[2, 3]), 1.0f32);
        let reduced = reduce_grad_to_shape(&grad, &[3]);
        assert_eq!(reduced.shape(), &[3]);
        assert!(reduced.iter().all(|&v| (v - 2.0).abs() < 1e-6));

        let scalar = reduce_grad_to_shape(&grad, &[]);
        assert_eq!(scalar.shape(), &[] as &[usize]);
        assert!((scalar.iter().next().unwrap() - 6.0).abs() < 1e-6);
    }
}
