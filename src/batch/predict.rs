use crate::{
    batch::ConfidenceTier,
    image::{ImagePreprocessor, ImageScanner},
    models::ModelManager,
    Result,
};
use std::fmt;
use std::path::PathBuf;

/// 控制台预测结果
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolePrediction {
    pub filename: String,
    pub predicted_class: String,
    pub confidence: f32,
    pub tier: ConfidenceTier,
}

impl fmt::Display for ConsolePrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({:.4}) [{}]",
            self.filename, self.predicted_class, self.confidence, self.tier
        )
    }
}

/// 逐张预测并返回结果（不写文件），单张失败以 `Err` 返回
pub fn predict_folder(
    models: &ModelManager,
    preprocessor: &ImagePreprocessor,
    scanner: &ImageScanner,
) -> Vec<(PathBuf, Result<ConsolePrediction>)> {
    tracing::info!("Scanning folder: {}", scanner.root().display());

    scanner
        .iter()
        .map(|path| {
            let result = predict_one(models, preprocessor, &path);
            (path, result)
        })
        .collect()
}

fn predict_one(
    models: &ModelManager,
    preprocessor: &ImagePreprocessor,
    path: &std::path::Path,
) -> Result<ConsolePrediction> {
    let batch = preprocessor.preprocess_path(path)?;
    let prediction = models.predict(batch)?;

    Ok(ConsolePrediction {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        predicted_class: models.label_for(&prediction),
        confidence: prediction.confidence,
        tier: ConfidenceTier::from_confidence(prediction.confidence),
    })
}
