use crate::utils::error::SkinError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// CSV中的一行：一次被接受的预测
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    pub filepath: String,
    pub predicted_class: String,
    pub confidence: f32,
}

/// 运行期计数器（不跨运行持久化）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub scanned: usize,
    pub written: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunCounters {
    pub fn record(&mut self, outcome: &ImageOutcome) {
        self.scanned += 1;
        match outcome {
            ImageOutcome::Written => self.written += 1,
            ImageOutcome::Skipped { .. } => self.skipped += 1,
            ImageOutcome::Failed { .. } => self.errors += 1,
        }
    }

    /// written + skipped + errors == scanned
    pub fn is_balanced(&self) -> bool {
        self.written + self.skipped + self.errors == self.scanned
    }
}

/// 单张图片的终态
#[derive(Debug)]
pub enum ImageOutcome {
    Written,
    Skipped { confidence: f32 },
    Failed { error: SkinError },
}

/// 批处理完成后的汇总
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub counters: RunCounters,
    pub output_path: PathBuf,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Done. Scanned: {} images, Written to CSV: {}",
            self.counters.scanned, self.counters.written
        )?;
        if self.counters.skipped > 0 || self.counters.errors > 0 {
            writeln!(
                f,
                "Skipped (low confidence): {}, Errors: {}",
                self.counters.skipped, self.counters.errors
            )?;
        }
        write!(f, "CSV saved at: {}", self.output_path.display())
    }
}

/// 置信度分档
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.85 {
            ConfidenceTier::High
        } else if confidence >= 0.5 {
            ConfidenceTier::Moderate
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "High certainty",
            ConfidenceTier::Moderate => "Moderate certainty",
            ConfidenceTier::Low => "Low certainty, please verify manually",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
