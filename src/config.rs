use crate::utils::error::SkinError;
use crate::Result;
use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "model/models/skin_model.onnx";
pub const DEFAULT_CLASS_MAP_PATH: &str = "model/models/class_indices.json";
pub const DEFAULT_OUTPUT_CSV: &str = "model/reports/predictions.csv";
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

#[derive(Debug, Clone)]
pub struct Config {
    /// 分类模型文件（ONNX）
    pub model_path: PathBuf,

    /// 类别索引映射文件（JSON，label -> index）
    pub class_map_path: PathBuf,

    /// 模型输入配置
    pub input: InputConfig,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,
}

#[derive(Debug, Clone)]
pub struct InputConfig {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
}

/// 模型输入张量的维度顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TensorLayout {
    /// [1, H, W, 3]，Keras导出的默认布局
    #[default]
    Nhwc,
    /// [1, 3, H, W]
    Nchw,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别
    pub optimization_level: i32,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            intra_threads: (num_cpus::get() * 3 / 4).max(1), // 使用75%的CPU核心
            optimization_level: 3,
        }
    }
}

impl Config {
    pub fn new(
        model_path: impl Into<PathBuf>,
        class_map_path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        layout: TensorLayout,
        intra_threads: Option<usize>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SkinError::Config(format!(
                "Resize target must be non-zero, got {}x{}",
                width, height
            )));
        }

        let mut onnx_config = OnnxConfig::default();
        if let Some(threads) = intra_threads {
            if threads == 0 {
                return Err(SkinError::Config("intra_threads must be at least 1".to_string()));
            }
            onnx_config.intra_threads = threads;
        }

        Ok(Self {
            model_path: model_path.into(),
            class_map_path: class_map_path.into(),
            input: InputConfig {
                width,
                height,
                layout,
            },
            onnx_config,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            class_map_path: PathBuf::from(DEFAULT_CLASS_MAP_PATH),
            input: InputConfig {
                width: DEFAULT_IMAGE_SIZE,
                height: DEFAULT_IMAGE_SIZE,
                layout: TensorLayout::default(),
            },
            onnx_config: OnnxConfig::default(),
        }
    }
}

/// 批量预测选项
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub image_dir: PathBuf,
    pub output_csv: PathBuf,
    pub recursive: bool,
    /// 最小置信度阈值（与置信度提升到f64后比较）
    pub min_confidence: f64,
    /// 低于阈值的结果也写入CSV
    pub include_low_confidence: bool,
    /// 推理前锐化
    pub sharpen: bool,
}

impl BatchOptions {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            output_csv: PathBuf::from(DEFAULT_OUTPUT_CSV),
            recursive: false,
            min_confidence: 0.0,
            include_low_confidence: false,
            sharpen: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(SkinError::Config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.output_csv.as_os_str().is_empty() {
            return Err(SkinError::Config("output_csv must not be empty".to_string()));
        }
        Ok(())
    }
}
