pub mod analyze;
pub mod evaluate;

pub use analyze::{PredictionAnalysis, DEFAULT_HISTOGRAM_BINS};
pub use evaluate::{evaluate_directory, ClassificationReport, ConfusionMatrix, Evaluation};
