use crate::utils::error::SkinError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// 输出分数允许的越界误差
const SCORE_TOLERANCE: f32 = 1e-4;

/// 不透明的图像分类器：输入batch-of-one张量，输出该图片的各类别分数
pub trait ImageClassifier {
    fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>>;
}

/// Top-1预测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub confidence: f32,
}

impl Prediction {
    /// 取最大分数的类别，相同分数取靠前的索引
    pub fn from_scores(scores: &[f32]) -> Result<Self> {
        if scores.is_empty() {
            return Err(SkinError::Inference("Classifier returned no scores".to_string()));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(SkinError::Inference(format!(
                "Classifier returned a non-finite score: {}",
                bad
            )));
        }

        let mut class_index = 0;
        let mut confidence = scores[0];
        for (i, &score) in scores.iter().enumerate().skip(1) {
            if score > confidence {
                confidence = score;
                class_index = i;
            }
        }

        if confidence < -SCORE_TOLERANCE || confidence > 1.0 + SCORE_TOLERANCE {
            return Err(SkinError::Inference(format!(
                "Top score {} is not a probability",
                confidence
            )));
        }

        Ok(Self {
            class_index,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

/// 基于ONNX Runtime的分类器
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_file(&config.model_path, config)
    }

    pub fn from_file(model_path: &Path, config: &Config) -> Result<Self> {
        if !model_path.exists() {
            return Err(SkinError::ModelLoad(format!(
                "Classification model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let level = optimization_level(config.onnx_config.optimization_level);
        let session = Session::builder()
            .map_err(|e| load_error(model_path, e))?
            .with_optimization_level(level)
            .map_err(|e| load_error(model_path, e))?
            .with_intra_threads(config.onnx_config.intra_threads)
            .map_err(|e| load_error(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| load_error(model_path, e))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(SkinError::ModelLoad(
                    "Classification model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(SkinError::ModelLoad(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input '{}', output '{}'",
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>> {
        if batch.shape()[0] != 1 {
            return Err(SkinError::Inference(format!(
                "Expected batch size 1, got {}",
                batch.shape()[0]
            )));
        }

        let input_tensor = Tensor::from_array(batch)?;
        let predictions = {
            let mut session = self.session.lock();
            let outputs = session
                .run(inputs![self.input_name.as_str() => input_tensor])
                .map_err(|e| SkinError::Inference(e.to_string()))?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output
                    .try_extract_array::<f32>()
                    .map_err(|e| SkinError::Inference(e.to_string()))?
                    .into_owned(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(SkinError::Inference(format!(
                        "Classification output '{}' not found. Available outputs: {:?}",
                        self.output_name, available_outputs
                    )));
                }
            }
        };

        // [1, num_classes] 或 [num_classes]
        match predictions.shape() {
            [1, _] | [_] => Ok(predictions.iter().copied().collect()),
            shape => Err(SkinError::Inference(format!(
                "Unexpected classification output shape {:?}",
                shape
            ))),
        }
    }
}

fn load_error(model_path: &Path, err: impl std::fmt::Display) -> SkinError {
    SkinError::ModelLoad(format!("{}: {}", model_path.display(), err))
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
