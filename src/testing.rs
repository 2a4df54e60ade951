//! Custom proptest strategies for generating tensor-shaped inputs.
//!
//! These are the generators the crate's own property-based suites are built
//! from: array shapes, arrays of a given shape, valid (possibly negative)
//! axis arguments, in-bounds signed indices, and label batches.

use crate::labels::Labels;
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

/// Generates non-empty array shapes with up to `max_dims` dimensions, each
/// side in `[1, max_side]`. Shrinks toward few, small dimensions.
pub fn shapes(max_dims: usize, max_side: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=max_side, 1..=max_dims)
}

/// Generates an `ArrayD<f32>` of the given fixed shape with elements drawn
/// from `[lo, hi]`.
pub fn arrays_of(shape: Vec<usize>, lo: f32, hi: f32) -> impl Strategy<Value = ArrayD<f32>> {
    let len = shape.iter().product::<usize>();
    prop::collection::vec(lo..=hi, len..=len).prop_map(move |values| {
        ArrayD::from_shape_vec(IxDyn(&shape), values).expect("generated length matches shape")
    })
}

/// Generates an `ArrayD<f32>` whose shape is drawn from `shape_strategy` and
/// whose elements lie in `[lo, hi]`.
pub fn arrays(
    shape_strategy: impl Strategy<Value = Vec<usize>>,
    lo: f32,
    hi: f32,
) -> impl Strategy<Value = ArrayD<f32>> {
    shape_strategy.prop_flat_map(move |shape| arrays_of(shape, lo, hi))
}

/// Generates a valid `axis` argument for a tensor of dimensionality `ndim`:
/// either `None` or a signed in-range axis, negative axes included.
pub fn valid_axis(ndim: usize) -> BoxedStrategy<Option<isize>> {
    if ndim == 0 {
        return Just(None).boxed();
    }
    let n = ndim as isize;
    prop_oneof![
        1 => Just(None),
        3 => (-n..n).prop_map(Some),
    ]
    .boxed()
}

/// Generates a valid signed index for an axis of the given size, in
/// `[-size, size)`.
///
/// # Panics
///
/// Panics if `size` is zero; an empty axis has no valid index.
pub fn integer_index(size: usize) -> impl Strategy<Value = isize> {
    assert!(size > 0, "integer_index requires a non-empty axis");
    let n = size as isize;
    -n..n
}

/// Draws `size` elements from `seq`, with or without replacement. Without
/// replacement the result is a shuffled subset, so `size` must not exceed
/// `seq.len()`.
pub fn choices<T>(seq: Vec<T>, size: usize, replace: bool) -> BoxedStrategy<Vec<T>>
where
    T: Clone + std::fmt::Debug + 'static,
{
    if size == 0 {
        return Just(Vec::new()).boxed();
    }
    assert!(!seq.is_empty(), "choices requires a non-empty sequence");
    if replace {
        prop::collection::vec(0..seq.len(), size)
            .prop_map(move |picks| picks.into_iter().map(|i| seq[i].clone()).collect())
            .boxed()
    } else {
        assert!(
            size <= seq.len(),
            "choices without replacement cannot draw {} items from {}",
            size,
            seq.len()
        );
        prop::sample::subsequence(seq, size).prop_shuffle().boxed()
    }
}

/// Generates a batch of `n` class labels, each in `[0, num_classes)`.
pub fn labels(n: usize, num_classes: usize) -> impl Strategy<Value = Labels> {
    assert!(num_classes > 0, "labels requires at least one class");
    prop::collection::vec(0..num_classes as i64, n..=n).prop_map(Labels::from_vec)
}
