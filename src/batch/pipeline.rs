use crate::{
    batch::{BatchSummary, ConfidenceFilter, CsvSink, ImageOutcome, ImageRecord, RunCounters},
    config::BatchOptions,
    image::{ImagePreprocessor, ImageScanner, PreprocessOptions},
    models::ModelManager,
    utils::error::SkinError,
    Config, Result,
};
use std::path::Path;
use std::time::Instant;

/// 批量预测流水线：枚举 -> 预处理 -> 推理 -> 过滤 -> 写CSV
///
/// 每张图片独立处理，单张失败只记录日志，不影响后续图片，也不会向CSV写入半行。
pub struct BatchPipeline<'a> {
    models: &'a ModelManager,
    preprocessor: &'a ImagePreprocessor,
    filter: ConfidenceFilter,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(
        models: &'a ModelManager,
        preprocessor: &'a ImagePreprocessor,
        filter: ConfidenceFilter,
    ) -> Self {
        Self {
            models,
            preprocessor,
            filter,
        }
    }

    /// 返回的计数器满足 written + skipped + errors == scanned。
    /// 单张图片的可恢复错误只计数；写CSV失败或其他不可恢复的错误会中止整个运行。
    pub fn run(&self, scanner: &ImageScanner, sink: &mut CsvSink) -> Result<RunCounters> {
        let start_time = Instant::now();
        let mut counters = RunCounters::default();

        tracing::info!(
            "Scanning {} (recursive: {})",
            scanner.root().display(),
            scanner.is_recursive()
        );

        for path in scanner.iter() {
            let outcome = match self.classify(&path) {
                Ok(record) if self.filter.accepts(record.confidence) => {
                    sink.write(&record)?;
                    ImageOutcome::Written
                }
                Ok(record) => {
                    tracing::info!(
                        "Skipped (low conf {:.3}): {}",
                        record.confidence,
                        path.display()
                    );
                    ImageOutcome::Skipped {
                        confidence: record.confidence,
                    }
                }
                Err(error) if error.is_per_item() => {
                    tracing::error!("Error processing '{}': {}", path.display(), error);
                    ImageOutcome::Failed { error }
                }
                Err(error) => {
                    tracing::error!("Aborting batch at '{}': {}", path.display(), error);
                    return Err(error);
                }
            };
            counters.record(&outcome);
        }

        tracing::info!(
            "Batch completed: scanned={}, written={}, skipped={}, errors={}, total_time={:.3}s",
            counters.scanned,
            counters.written,
            counters.skipped,
            counters.errors,
            start_time.elapsed().as_secs_f32()
        );

        Ok(counters)
    }

    /// 单张图片：预处理 + 推理，得到待写入的记录
    pub fn classify(&self, path: &Path) -> Result<ImageRecord> {
        let batch = self.preprocessor.preprocess_path(path)?;
        let prediction = self.models.predict(batch)?;

        Ok(ImageRecord {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            filepath: std::path::absolute(path)
                .map_err(|e| {
                    SkinError::ImageProcessing(format!(
                        "Cannot resolve {}: {}",
                        path.display(),
                        e
                    ))
                })?
                .to_string_lossy()
                .to_string(),
            predicted_class: self.models.label_for(&prediction),
            confidence: prediction.confidence,
        })
    }
}

/// 完整的批处理：加载模型、建立输出、逐张处理、输出汇总
pub fn run_batch(config: &Config, options: &BatchOptions) -> Result<BatchSummary> {
    options.validate()?;
    let models = ModelManager::load(config)?;
    run_batch_with(&models, options)
}

/// 使用已加载的模型上下文执行批处理
pub fn run_batch_with(models: &ModelManager, options: &BatchOptions) -> Result<BatchSummary> {
    options.validate()?;

    let scanner = ImageScanner::new(&options.image_dir, options.recursive)?;
    let preprocessor = ImagePreprocessor::new(
        PreprocessOptions::from_config(models.config()).with_sharpen(options.sharpen),
    )?;
    let mut sink = CsvSink::create(&options.output_csv)?;

    let pipeline = BatchPipeline::new(models, &preprocessor, ConfidenceFilter::from_options(options));
    let counters = pipeline.run(&scanner, &mut sink)?;
    let output_path = sink.finish()?;

    Ok(BatchSummary {
        counters,
        output_path,
    })
}
