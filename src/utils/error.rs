use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkinError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Class map error: {0}")]
    ClassMap(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
}

impl SkinError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SkinError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            SkinError::ClassMap(_) => "CLASS_MAP_ERROR",
            SkinError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            SkinError::Inference(_) => "INFERENCE_ERROR",
            SkinError::InvalidInput(_) => "INVALID_INPUT",
            SkinError::Config(_) => "CONFIG_ERROR",
            SkinError::Io(_) => "IO_ERROR",
            SkinError::Json(_) => "JSON_ERROR",
            SkinError::Csv(_) => "CSV_ERROR",
            SkinError::ImageDecode(_) => "IMAGE_DECODE_ERROR",
            SkinError::Ort(_) => "ORT_ERROR",
        }
    }

    /// 单张图片可恢复的错误（记录日志后继续处理下一张）
    pub fn is_per_item(&self) -> bool {
        matches!(
            self,
            SkinError::ImageProcessing(_)
                | SkinError::Inference(_)
                | SkinError::ImageDecode(_)
                | SkinError::Ort(_)
        )
    }
}
