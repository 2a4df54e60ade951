pub mod losses;
pub use losses::{softmax_crossentropy, SoftmaxCrossEntropy};
