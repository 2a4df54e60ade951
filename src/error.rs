use thiserror::Error;

/// Errors reported by tensor construction and the validated public operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    #[error("axis {axis} is out of bounds for a tensor with {ndim} dimension(s)")]
    AxisOutOfBounds { axis: isize, ndim: usize },

    #[error("cannot reshape tensor of shape {from:?} into {to:?}")]
    IncompatibleShape { from: Vec<usize>, to: Vec<usize> },

    #[error("scores must have shape (rows, classes), got {0:?}")]
    BadScoresShape(Vec<usize>),

    #[error("labels must be a 1-D array of {rows} class indices, got shape {shape:?}")]
    BadLabelShape { rows: usize, shape: Vec<usize> },

    #[error("label {label} at row {row} is out of range for {classes} classes")]
    LabelOutOfRange {
        row: usize,
        label: i64,
        classes: usize,
    },
}
