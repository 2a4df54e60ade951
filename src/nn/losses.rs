use crate::error::TensorError;
use crate::labels::Labels;
use crate::ops::Operation;
use crate::tensor::Tensor;
use log::debug;
use ndarray::{ArrayD, Ix2, IxDyn};
use std::any::Any;
use std::sync::Arc;

/// Fused softmax + cross-entropy over the rows of `(rows, classes)` scores,
/// numerically stable and mean-reduced over rows.
///
/// Labels are captured by the operation rather than passed as a tensor input;
/// they are integer class indices and receive no gradient. Shape and range
/// validation happens in [`softmax_crossentropy`] before the operation is
/// applied.
pub struct SoftmaxCrossEntropy {
    labels: ArrayD<i64>,
}

impl Operation for SoftmaxCrossEntropy {
    fn forward(&self, inputs: &[Tensor]) -> ArrayD<f32> {
        let scores = inputs[0]
            .lock()
            .data
            .clone()
            .into_dimensionality::<Ix2>()
            .expect("scores validated as 2-D");
        let rows = scores.nrows();
        let mut loss_sum = 0.0f32;
        for (i, row) in scores.rows().into_iter().enumerate() {
            let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for &v in row.iter() {
                sum += (v - max).exp();
            }
            let logsum = sum.ln();
            let label = self.labels[[i]] as usize;
            // -log softmax(scores)[i, label]
            loss_sum += -(row[label] - max - logsum);
        }
        ArrayD::from_elem(IxDyn(&[]), loss_sum / (rows as f32))
    }

    fn backward(&self, inputs: &[Tensor], output_grad: &ArrayD<f32>) -> Vec<ArrayD<f32>> {
        let scores = inputs[0]
            .lock()
            .data
            .clone()
            .into_dimensionality::<Ix2>()
            .expect("scores validated as 2-D");
        let rows = scores.nrows();
        let og = *output_grad
            .iter()
            .next()
            .expect("loss backward expects a scalar output gradient");
        // grad = (softmax(scores) - onehot(labels)) / rows
        let mut grad = scores;
        for (i, mut row) in grad.rows_mut().into_iter().enumerate() {
            let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0f32;
            for v in row.iter_mut() {
                *v = (*v - max).exp();
                sum += *v;
            }
            for v in row.iter_mut() {
                *v /= sum;
            }
            let label = self.labels[[i]] as usize;
            row[label] -= 1.0;
            for v in row.iter_mut() {
                *v *= og / (rows as f32);
            }
        }
        vec![grad.into_dyn()]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Computes the softmax cross-entropy loss of `scores` against integer class
/// `labels`, averaged over rows.
///
/// `scores` must have shape `(rows, classes)` and `labels` must be a 1-D
/// array of `rows` indices, each within `[0, classes)`. Invalid inputs are
/// reported as errors rather than panics.
pub fn softmax_crossentropy(scores: &Tensor, labels: &Labels) -> Result<Tensor, TensorError> {
    let shape = scores.lock().data.shape().to_vec();
    if shape.len() != 2 {
        return Err(TensorError::BadScoresShape(shape));
    }
    let (rows, classes) = (shape[0], shape[1]);
    if labels.0.ndim() != 1 || labels.0.shape()[0] != rows {
        return Err(TensorError::BadLabelShape {
            rows,
            shape: labels.0.shape().to_vec(),
        });
    }
    for (row, &label) in labels.0.iter().enumerate() {
        if label < 0 || label as usize >= classes {
            return Err(TensorError::LabelOutOfRange {
                row,
                label,
                classes,
            });
        }
    }
    debug!("softmax_crossentropy: {} row(s), {} class(es)", rows, classes);
    Ok(Tensor::apply(
        Arc::new(SoftmaxCrossEntropy {
            labels: labels.0.clone(),
        }),
        &[scores.clone()],
    ))
}
