use crate::error::TensorError;
use crate::ops::{
    normalize_axis, Add, Div, Log, LogSoftmax, Mean, Mul, Operation, Repeat, Reshape, Softmax, Sub,
    Sum,
};
use log::debug;
use ndarray::{ArrayD, IxDyn};
use rand::Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// `TensorData` contains the actual data of a tensor, along with metadata for
/// automatic differentiation.
pub struct TensorData {
    /// The tensor's data, stored as a dynamically-dimensioned array.
    pub data: ArrayD<f32>,
    /// The gradient of the tensor, if one has been computed.
    pub grad: Option<ArrayD<f32>>,
    /// The operation that created this tensor, if any.
    pub creator: Option<Arc<dyn Operation + Send + Sync>>,
    /// The input tensors that were used to create this tensor.
    pub inputs: Vec<Tensor>,
    /// Whether this tensor requires a gradient.
    pub requires_grad: bool,
}

/// A multi-dimensional array (tensor) that supports automatic differentiation.
///
/// Tensors created from operations on other tensors with `requires_grad = true`
/// become part of a computation graph; [`Tensor::backward`] walks that graph in
/// reverse topological order and accumulates gradients into every participating
/// tensor.
#[derive(Clone)]
pub struct Tensor(Arc<Mutex<TensorData>>);

impl Tensor {
    /// Creates a new tensor.
    pub fn new(data: ArrayD<f32>, requires_grad: bool) -> Self {
        Tensor(Arc::new(Mutex::new(TensorData {
            data,
            grad: None,
            creator: None,
            inputs: vec![],
            requires_grad,
        })))
    }

    /// Creates a 1-D tensor from a vector of values.
    pub fn from_vec(values: Vec<f32>, requires_grad: bool) -> Self {
        let len = values.len();
        let data = ArrayD::from_shape_vec(IxDyn(&[len]), values)
            .expect("1-D shape always matches the value count");
        Tensor::new(data, requires_grad)
    }

    /// Creates a tensor of the given shape with entries drawn uniformly from `[lo, hi)`.
    pub fn rand_uniform(shape: &[usize], lo: f32, hi: f32) -> Self {
        let mut rng = rand::rng();
        let data = ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.random_range(lo..hi));
        Tensor::new(data, true)
    }

    /// Applies an operation to a set of input tensors.
    ///
    /// This is the primary way that computation graphs are constructed.
    pub fn apply(op: Arc<dyn Operation + Send + Sync>, inputs: &[Tensor]) -> Tensor {
        let requires_grad = inputs.iter().any(|t| t.lock().requires_grad);
        let data = op.forward(inputs);
        Tensor(Arc::new(Mutex::new(TensorData {
            data,
            grad: None,
            creator: Some(op),
            inputs: inputs.to_vec(),
            requires_grad,
        })))
    }

    /// Adds two tensors, broadcasting as necessary.
    pub fn add(&self, other: &Tensor) -> Tensor {
        Tensor::apply(Arc::new(Add), &[self.clone(), other.clone()])
    }

    /// Subtracts two tensors, broadcasting as necessary.
    pub fn sub(&self, other: &Tensor) -> Tensor {
        Tensor::apply(Arc::new(Sub), &[self.clone(), other.clone()])
    }

    /// Multiplies two tensors, broadcasting as necessary.
    pub fn mul(&self, other: &Tensor) -> Tensor {
        Tensor::apply(Arc::new(Mul), &[self.clone(), other.clone()])
    }

    /// Divides two tensors, broadcasting as necessary.
    pub fn div(&self, other: &Tensor) -> Tensor {
        Tensor::apply(Arc::new(Div), &[self.clone(), other.clone()])
    }

    /// Negates the tensor (multiply by a -1 scalar).
    pub fn neg(&self) -> Tensor {
        let scalar = Tensor::new(ArrayD::from_elem(IxDyn(&[]), -1.0), false);
        Tensor::apply(Arc::new(Mul), &[self.clone(), scalar])
    }

    /// Element-wise natural logarithm.
    pub fn log(&self) -> Tensor {
        Tensor::apply(Arc::new(Log), &[self.clone()])
    }

    /// Computes the sum of the tensor's elements.
    pub fn sum(&self) -> Tensor {
        Tensor::apply(Arc::new(Sum), &[self.clone()])
    }

    /// Computes the mean of the tensor's elements.
    pub fn mean(&self) -> Tensor {
        Tensor::apply(Arc::new(Mean), &[self.clone()])
    }

    /// Numerically stable softmax along the specified axis.
    pub fn softmax(&self, axis: usize) -> Tensor {
        Tensor::apply(Arc::new(Softmax::new(axis)), &[self.clone()])
    }

    /// Stable log-softmax along the specified axis.
    pub fn log_softmax(&self, axis: usize) -> Tensor {
        Tensor::apply(Arc::new(LogSoftmax::new(axis)), &[self.clone()])
    }

    /// Repeats entries of the tensor `repeats` times consecutively.
    ///
    /// With `axis = Some(k)` each slice along axis `k` is repeated, so the
    /// output dimension along `k` grows to `n * repeats`. Negative axes count
    /// from the right. With `axis = None` the tensor is treated as flattened
    /// in logical (row-major) order and the result is 1-D.
    ///
    /// On the backward pass every repeated copy contributes its gradient back
    /// to the entry it was copied from.
    pub fn repeat(&self, repeats: usize, axis: Option<isize>) -> Result<Tensor, TensorError> {
        let ndim = self.lock().data.ndim();
        let axis_norm = match axis {
            Some(ax) => Some(normalize_axis(ax, ndim)?),
            None => None,
        };
        Ok(Tensor::apply(
            Arc::new(Repeat::new(repeats, axis_norm)),
            &[self.clone()],
        ))
    }

    /// Reshapes the tensor, preserving element order.
    pub fn reshape(&self, shape: Vec<usize>) -> Result<Tensor, TensorError> {
        let from = self.lock().data.shape().to_vec();
        if from.iter().product::<usize>() != shape.iter().product::<usize>() {
            return Err(TensorError::IncompatibleShape { from, to: shape });
        }
        Ok(Tensor::apply(Arc::new(Reshape::new(shape)), &[self.clone()]))
    }

    /// Locks the tensor's data for reading or writing.
    pub fn lock(&self) -> MutexGuard<'_, TensorData> {
        self.0.lock().unwrap()
    }

    /// Sets the gradient of this tensor to zero.
    pub fn zero_grad(&self) {
        self.lock().grad = None;
    }

    /// Detaches the tensor from the computation graph.
    pub fn detach(&self) -> Tensor {
        let lock = self.lock();
        Tensor::new(lock.data.clone(), false)
    }

    /// Returns whether this tensor requires gradients.
    pub fn requires_grad(&self) -> bool {
        self.lock().requires_grad
    }

    /// Sets whether this tensor requires gradients.
    pub fn set_requires_grad(&self, requires_grad: bool) {
        self.lock().requires_grad = requires_grad;
    }

    /// Performs backpropagation starting from this tensor.
    ///
    /// Computes the gradients of all tensors in the computation graph that
    /// have `requires_grad = true`. Each node's backward runs exactly once per
    /// call; gradients flowing into a tensor from several consumers are summed.
    pub fn backward(&self) {
        // Seed the output gradient with ones on the root call.
        {
            let mut lock = self.lock();
            if lock.grad.is_none() {
                lock.grad = Some(ArrayD::ones(lock.data.dim()));
            }
        }

        let mut visited = HashSet::new();
        let mut topo: Vec<Tensor> = Vec::new();
        self.build_topo(&mut visited, &mut topo);
        debug!("backward pass over {} graph node(s)", topo.len());

        for node in topo.iter().rev() {
            // Clone what the backward call needs, then release the lock before
            // touching the inputs.
            let (creator, inputs, output_grad) = {
                let lock = node.lock();
                match (&lock.creator, &lock.grad) {
                    (Some(creator), Some(grad)) => {
                        (creator.clone(), lock.inputs.clone(), grad.clone())
                    }
                    _ => continue,
                }
            };
            let input_grads = creator.backward(&inputs, &output_grad);
            for (input, grad_piece) in inputs.iter().zip(input_grads.into_iter()) {
                let mut lock = input.lock();
                if !lock.requires_grad {
                    continue;
                }
                match &mut lock.grad {
                    Some(grad) => *grad += &grad_piece,
                    None => lock.grad = Some(grad_piece),
                }
            }
        }
    }

    /// Builds a topological sort of the computation graph.
    fn build_topo(
        &self,
        visited: &mut HashSet<*const Mutex<TensorData>>,
        topo_order: &mut Vec<Tensor>,
    ) {
        let ptr = Arc::as_ptr(&self.0);
        if !visited.contains(&ptr) {
            visited.insert(ptr);
            let inputs = self.lock().inputs.clone();
            for input in &inputs {
                input.build_topo(visited, topo_order);
            }
            topo_order.push(self.clone());
        }
    }
}

// Implement Deref to allow treating Tensor like Arc<Mutex<TensorData>>
use std::ops::Deref;

impl Deref for Tensor {
    type Target = Arc<Mutex<TensorData>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Tensors compare and hash by identity.
impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Tensor {}

use std::hash::{Hash, Hasher};

impl Hash for Tensor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}
