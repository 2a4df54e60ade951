use ndarray::{ArrayD, Ix2, IxDyn};

/// Wrapper for integer label arrays (e.g., class indices).
///
/// Loss functions take labels through this type rather than as float
/// tensors, so "labels must be integer-typed" is enforced by construction.
#[derive(Debug, Clone)]
pub struct Labels(pub ArrayD<i64>);

impl Labels {
    pub fn new(arr: ArrayD<i64>) -> Self {
        Labels(arr)
    }

    /// Creates 1-D labels from a vector of class indices.
    pub fn from_vec(indices: Vec<i64>) -> Self {
        let len = indices.len();
        Labels(
            ArrayD::from_shape_vec(IxDyn(&[len]), indices)
                .expect("1-D shape always matches the index count"),
        )
    }

    /// Converts 1-D label indices to a one-hot `(n, num_classes)` f32 array.
    ///
    /// Indices must lie in `[0, num_classes)`; callers validate before
    /// encoding.
    pub fn to_one_hot(&self, num_classes: usize) -> ArrayD<f32> {
        assert!(
            self.0.ndim() == 1,
            "Labels::to_one_hot only accepts a 1-D index array"
        );
        let len = self.0.shape()[0];
        let mut out = ArrayD::zeros(IxDyn(&[len, num_classes]))
            .into_dimensionality::<Ix2>()
            .expect("freshly built 2-D array");
        for (i, &idx) in self.0.iter().enumerate() {
            out[[i, idx as usize]] = 1.0;
        }
        out.into_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_hot_marks_each_row_once() {
        let labels = Labels::from_vec(vec![2, 0, 1]);
        let onehot = labels.to_one_hot(3);
        assert_eq!(onehot.shape(), &[3, 3]);
        assert_eq!(onehot[[0, 2]], 1.0);
        assert_eq!(onehot[[1, 0]], 1.0);
        assert_eq!(onehot[[2, 1]], 1.0);
        assert_eq!(onehot.sum(), 3.0);
    }
}
