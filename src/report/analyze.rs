use crate::batch::ImageRecord;
use crate::utils::error::SkinError;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// 直方图条形最大宽度
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassCount {
    pub class: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceStats {
    pub mean: f64,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f32,
    pub upper: f32,
    pub count: usize,
}

/// 预测CSV的统计：各类别数量 + 置信度分布
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionAnalysis {
    pub total: usize,
    pub class_counts: Vec<ClassCount>,
    pub confidence: Option<ConfidenceStats>,
    pub histogram: Vec<HistogramBin>,
}

impl PredictionAnalysis {
    pub fn from_csv(path: &Path, bins: usize) -> Result<Self> {
        if !path.exists() {
            return Err(SkinError::InvalidInput(format!(
                "Predictions CSV not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize::<ImageRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::info!("Loaded {} predictions from {}", records.len(), path.display());
        Self::from_records(&records, bins)
    }

    pub fn from_records(records: &[ImageRecord], bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(SkinError::Config("Histogram needs at least one bin".to_string()));
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in records {
            *counts.entry(record.predicted_class.as_str()).or_default() += 1;
        }
        let mut class_counts: Vec<ClassCount> = counts
            .into_iter()
            .map(|(class, count)| ClassCount {
                class: class.to_string(),
                count,
            })
            .collect();
        class_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.class.cmp(&b.class)));

        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: i as f32 / bins as f32,
                upper: (i + 1) as f32 / bins as f32,
                count: 0,
            })
            .collect();
        for record in records {
            histogram[bin_index(record.confidence, bins)].count += 1;
        }

        let confidence = if records.is_empty() {
            None
        } else {
            let sum: f64 = records.iter().map(|r| r.confidence as f64).sum();
            Some(ConfidenceStats {
                mean: sum / records.len() as f64,
                min: records.iter().map(|r| r.confidence).fold(f32::INFINITY, f32::min),
                max: records.iter().map(|r| r.confidence).fold(f32::NEG_INFINITY, f32::max),
            })
        };

        Ok(Self {
            total: records.len(),
            class_counts,
            confidence,
            histogram,
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// 等宽分箱，最后一个箱包含1.0
fn bin_index(confidence: f32, bins: usize) -> usize {
    let clamped = confidence.clamp(0.0, 1.0);
    ((clamped * bins as f32) as usize).min(bins - 1)
}

impl fmt::Display for PredictionAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Predictions: {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Number of predictions per class:")?;
        let width = self.class_counts.iter().map(|c| c.class.len()).max().unwrap_or(0);
        for c in &self.class_counts {
            writeln!(f, "  {:<width$} {:>6}", c.class, c.count)?;
        }

        writeln!(f)?;
        match &self.confidence {
            Some(stats) => writeln!(
                f,
                "Confidence: mean {:.4}, min {:.4}, max {:.4}",
                stats.mean, stats.min, stats.max
            )?,
            None => writeln!(f, "Confidence: no data")?,
        }

        writeln!(f, "Confidence score distribution:")?;
        let peak = self.histogram.iter().map(|b| b.count).max().unwrap_or(0);
        for bin in &self.histogram {
            let bar = if peak == 0 {
                0
            } else {
                (bin.count * BAR_WIDTH).div_ceil(peak)
            };
            writeln!(
                f,
                "  [{:.2}, {:.2}{} {:>6} {}",
                bin.lower,
                bin.upper,
                if bin.upper >= 1.0 { "]" } else { ")" },
                bin.count,
                "#".repeat(bar)
            )?;
        }
        Ok(())
    }
}
