use crate::batch::ImageRecord;
use crate::utils::error::SkinError;
use crate::Result;
use csv::Writer;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 4] = ["filename", "filepath", "predicted_class", "confidence"];

/// 预测结果CSV输出；每次运行重建文件，不跨运行追加
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
    rows: usize,
}

impl CsvSink {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SkinError::Config(format!(
                    "Cannot create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = File::create(path)?;
        let mut writer = Writer::from_writer(file);
        writer.write_record(CSV_HEADER)?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    pub fn write(&mut self, record: &ImageRecord) -> Result<()> {
        self.writer.write_record([
            record.filename.as_str(),
            record.filepath.as_str(),
            record.predicted_class.as_str(),
            format_confidence(record.confidence).as_str(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// 刷新并返回输出文件的绝对路径
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        tracing::debug!("Flushed {} rows to {}", self.rows, self.path.display());
        Ok(std::path::absolute(&self.path)?)
    }
}

/// 固定6位小数
pub fn format_confidence(confidence: f32) -> String {
    format!("{:.6}", confidence)
}
