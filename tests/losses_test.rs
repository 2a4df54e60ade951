use ndarray::{arr1, ArrayD, IxDyn};
use proptest::prelude::*;
use tensorgrad::error::TensorError;
use tensorgrad::labels::Labels;
use tensorgrad::nn::softmax_crossentropy;
use tensorgrad::tensor::Tensor;
use tensorgrad::testing::{arrays_of, labels as label_batch};

#[test]
fn rejects_one_dimensional_scores() {
    let scores = Tensor::new(arr1(&[1.0, 1.0]).into_dyn(), false);
    let y = Labels::from_vec(vec![0, 0]);
    assert!(matches!(
        softmax_crossentropy(&scores, &y),
        Err(TensorError::BadScoresShape(_))
    ));
}

#[test]
fn rejects_bad_label_ndim() {
    let scores = Tensor::new(ArrayD::ones(IxDyn(&[2, 1])), false);
    let y = Labels::new(ArrayD::zeros(IxDyn(&[2, 1])));
    assert!(matches!(
        softmax_crossentropy(&scores, &y),
        Err(TensorError::BadLabelShape { .. })
    ));
}

#[test]
fn rejects_bad_label_count() {
    let scores = Tensor::new(ArrayD::ones(IxDyn(&[2, 1])), false);
    let y = Labels::from_vec(vec![0, 0, 0]);
    assert!(matches!(
        softmax_crossentropy(&scores, &y),
        Err(TensorError::BadLabelShape { rows: 2, .. })
    ));
}

#[test]
fn rejects_out_of_range_labels() {
    let scores = Tensor::new(ArrayD::ones(IxDyn(&[3, 4])), false);

    let too_big = Labels::from_vec(vec![0, 4, 1]);
    assert!(matches!(
        softmax_crossentropy(&scores, &too_big),
        Err(TensorError::LabelOutOfRange { row: 1, label: 4, classes: 4 })
    ));

    let negative = Labels::from_vec(vec![0, 1, -1]);
    assert!(matches!(
        softmax_crossentropy(&scores, &negative),
        Err(TensorError::LabelOutOfRange { row: 2, label: -1, .. })
    ));
}

#[test]
fn uniform_scores_give_log_classes() {
    // All-equal scores: loss is ln(classes) regardless of the labels.
    let scores = Tensor::new(ArrayD::zeros(IxDyn(&[4, 5])), true);
    let y = Labels::from_vec(vec![0, 1, 2, 3]);
    let loss = softmax_crossentropy(&scores, &y).unwrap();
    let value = *loss.lock().data.iter().next().unwrap();
    assert!((value - (5.0f32).ln()).abs() < 1e-6);
}

#[test]
fn fused_loss_numeric_gradient() {
    let scores = Tensor::rand_uniform(&[3, 4], -5.0, 5.0);
    let y = Labels::from_vec(vec![2, 0, 3]);
    let data = scores.lock().data.clone();

    let loss = softmax_crossentropy(&scores, &y).unwrap();
    loss.backward();
    let analytic = scores.lock().grad.clone().unwrap();

    let h = 1e-2;
    let mut numeric = ArrayD::zeros(IxDyn(&[3, 4]));
    for i in 0..data.len() {
        let mut plus = data.clone();
        let mut minus = data.clone();
        plus.as_slice_mut().unwrap()[i] += h;
        minus.as_slice_mut().unwrap()[i] -= h;
        let eval = |d: &ArrayD<f32>| -> f32 {
            let t = Tensor::new(d.clone(), false);
            let loss = softmax_crossentropy(&t, &Labels::from_vec(vec![2, 0, 3])).unwrap();
            let value = *loss.lock().data.iter().next().unwrap();
            value
        };
        numeric.as_slice_mut().unwrap()[i] = (eval(&plus) - eval(&minus)) / (2.0 * h);
    }

    for (a, n) in analytic.iter().zip(numeric.iter()) {
        assert!(
            (a - n).abs() < 1e-3 + 1e-2 * n.abs(),
            "analytic {} vs numeric {}",
            a,
            n
        );
    }
}

proptest! {
    // The fused loss must agree with the composed formulation
    // -(1/N) * sum(log(softmax(scores)) * onehot(labels)), in both the loss
    // value and the gradient that reaches the scores.
    #[test]
    fn fused_matches_composed_formulation(
        (scores, y) in (2usize..6, 2usize..6).prop_flat_map(|(n, c)| {
            (arrays_of(vec![n, c], -10.0, 10.0), label_batch(n, c))
        })
    ) {
        let rows = scores.shape()[0];
        let classes = scores.shape()[1];

        let s_fused = Tensor::new(scores.clone(), true);
        let fused = softmax_crossentropy(&s_fused, &y).unwrap();
        fused.backward();

        let s_composed = Tensor::new(scores.clone(), true);
        let probs = s_composed.softmax(1);
        let onehot = Tensor::new(y.to_one_hot(classes), false);
        let scale = Tensor::new(
            ArrayD::from_elem(IxDyn(&[]), -1.0 / rows as f32),
            false,
        );
        let composed = probs.log().mul(&onehot).sum().mul(&scale);
        composed.backward();

        let fused_value = *fused.lock().data.iter().next().unwrap();
        let composed_value = *composed.lock().data.iter().next().unwrap();
        prop_assert!(
            (fused_value - composed_value).abs() < 1e-4 + 1e-4 * composed_value.abs(),
            "loss mismatch: fused {} vs composed {}",
            fused_value,
            composed_value
        );

        let fused_grad = s_fused.lock().grad.clone().unwrap();
        let composed_grad = s_composed.lock().grad.clone().unwrap();
        prop_assert_eq!(fused_grad.shape(), composed_grad.shape());
        for (f, c) in fused_grad.iter().zip(composed_grad.iter()) {
            prop_assert!(
                (f - c).abs() < 1e-4 + 1e-4 * c.abs(),
                "gradient mismatch: fused {} vs composed {}",
                f,
                c
            );
        }
    }

    #[test]
    fn loss_is_non_negative(
        (scores, y) in (1usize..5, 2usize..5).prop_flat_map(|(n, c)| {
            (arrays_of(vec![n, c], -10.0, 10.0), label_batch(n, c))
        })
    ) {
        let t = Tensor::new(scores, false);
        let loss = softmax_crossentropy(&t, &y).unwrap();
        let value = *loss.lock().data.iter().next().unwrap();
        prop_assert!(value >= 0.0);
    }
}
