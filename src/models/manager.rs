use crate::models::{ClassMap, ImageClassifier, OnnxClassifier, Prediction};
use crate::Result;
use crate::{Config, TensorLayout};
use ndarray::Array4;

/// 模型上下文：分类器 + 类别映射
///
/// 启动时显式构建一次，之后以引用方式传给各个流程；运行期间只读。
pub struct ModelManager {
    classifier: Box<dyn ImageClassifier>,
    class_map: ClassMap,
    config: Config,
}

impl ModelManager {
    /// 加载ONNX模型与类别映射，任一失败都视为致命错误
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let class_map = ClassMap::from_path(&config.class_map_path)?;
        let classifier = OnnxClassifier::new(config)?;

        tracing::info!("Model manager initialized successfully");
        Ok(Self::with_classifier(Box::new(classifier), class_map, config.clone()))
    }

    pub fn with_classifier(
        classifier: Box<dyn ImageClassifier>,
        class_map: ClassMap,
        config: Config,
    ) -> Self {
        Self {
            classifier,
            class_map,
            config,
        }
    }

    /// 推理并取Top-1
    pub fn predict(&self, batch: Array4<f32>) -> Result<Prediction> {
        let scores = self.classifier.predict(batch)?;
        if scores.len() != self.class_map.len() {
            tracing::debug!(
                "Classifier returned {} scores for {} known classes",
                scores.len(),
                self.class_map.len()
            );
        }
        Prediction::from_scores(&scores)
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    pub fn label_for(&self, prediction: &Prediction) -> String {
        self.class_map.label_for(prediction.class_index)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_stats(&self) -> ModelStats {
        ModelStats {
            num_classes: self.class_map.len(),
            input_width: self.config.input.width,
            input_height: self.config.input.height,
            layout: self.config.input.layout,
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone)]
pub struct ModelStats {
    pub num_classes: usize,
    pub input_width: u32,
    pub input_height: u32,
    pub layout: TensorLayout,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
