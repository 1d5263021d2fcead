pub mod class_map;
pub mod classifier;
pub mod manager;

pub use class_map::ClassMap;
pub use classifier::{ImageClassifier, OnnxClassifier, Prediction};
pub use manager::{ModelManager, ModelStats};
