pub mod filter;
pub mod pipeline;
pub mod predict;
pub mod sink;
pub mod types;

pub use filter::ConfidenceFilter;
pub use pipeline::{run_batch, run_batch_with, BatchPipeline};
pub use predict::{predict_folder, ConsolePrediction};
pub use sink::{format_confidence, CsvSink, CSV_HEADER};
pub use types::{BatchSummary, ConfidenceTier, ImageOutcome, ImageRecord, RunCounters};
