//! The strategies in `tensorgrad::testing` promise to only ever produce
//! valid values; these properties pin that contract down.

use proptest::prelude::*;
use tensorgrad::testing::{arrays, choices, integer_index, labels, shapes, valid_axis};

proptest! {
    #[test]
    fn shapes_respect_bounds(shape in shapes(4, 5)) {
        prop_assert!(!shape.is_empty());
        prop_assert!(shape.len() <= 4);
        prop_assert!(shape.iter().all(|&side| (1..=5).contains(&side)));
    }

    #[test]
    fn arrays_match_generated_shape(x in arrays(shapes(3, 4), -2.0, 2.0)) {
        prop_assert!(x.ndim() >= 1 && x.ndim() <= 3);
        prop_assert!(x.shape().iter().all(|&side| (1..=4).contains(&side)));
        prop_assert!(x.iter().all(|v| (-2.0..=2.0).contains(v)));
    }

    #[test]
    fn valid_axis_is_always_in_range(
        (ndim, axis) in (1usize..5).prop_flat_map(|nd| (Just(nd), valid_axis(nd)))
    ) {
        if let Some(ax) = axis {
            let n = ndim as isize;
            prop_assert!((-n..n).contains(&ax));
        }
    }

    #[test]
    fn integer_index_is_always_in_bounds(
        (size, index) in (1usize..8).prop_flat_map(|s| (Just(s), integer_index(s)))
    ) {
        let n = size as isize;
        prop_assert!((-n..n).contains(&index));
        // Both signs resolve to the same valid positions.
        let resolved = if index < 0 { n + index } else { index };
        prop_assert!((0..n).contains(&resolved));
    }

    #[test]
    fn choices_with_replacement_draws_from_seq(
        picked in choices(vec![10u8, 20, 30], 5, true)
    ) {
        prop_assert_eq!(picked.len(), 5);
        prop_assert!(picked.iter().all(|v| [10u8, 20, 30].contains(v)));
    }

    #[test]
    fn choices_without_replacement_never_repeats(
        picked in choices(vec![1u8, 2, 3, 4, 5], 3, false)
    ) {
        prop_assert_eq!(picked.len(), 3);
        let mut seen = picked.clone();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), 3);
    }

    #[test]
    fn labels_stay_in_class_range(y in labels(6, 4)) {
        prop_assert_eq!(y.0.shape(), &[6usize] as &[usize]);
        prop_assert!(y.0.iter().all(|&v| (0..4).contains(&v)));
    }
}
