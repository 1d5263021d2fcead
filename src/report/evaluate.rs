use crate::image::{ImagePreprocessor, ImageScanner};
use crate::models::ModelManager;
use crate::utils::error::SkinError;
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// 混淆矩阵：行 = 真实类别，列 = 预测类别
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(size: usize) -> Self {
        Self {
            counts: vec![vec![0; size]; size],
        }
    }

    pub fn size(&self) -> usize {
        self.counts.len()
    }

    /// 任一位置越界时返回 false，不计数
    pub fn add(&mut self, actual: usize, predicted: usize) -> bool {
        let size = self.size();
        if actual >= size || predicted >= size {
            return false;
        }
        self.counts[actual][predicted] += 1;
        true
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual][predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.size()).map(|i| self.counts[i][i]).sum()
    }

    fn row_sum(&self, row: usize) -> usize {
        self.counts[row].iter().sum()
    }

    fn col_sum(&self, col: usize) -> usize {
        self.counts.iter().map(|r| r[col]).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// 分类报告（precision / recall / f1 / support）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total: usize,
}

impl ClassificationReport {
    pub fn from_matrix(matrix: &ConfusionMatrix, class_names: &[String]) -> Self {
        let total = matrix.total();
        let classes: Vec<ClassMetrics> = (0..matrix.size())
            .map(|i| {
                let tp = matrix.get(i, i) as f64;
                let precision = ratio(tp, matrix.col_sum(i) as f64);
                let recall = ratio(tp, matrix.row_sum(i) as f64);
                ClassMetrics {
                    name: class_names.get(i).cloned().unwrap_or_else(|| i.to_string()),
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support: matrix.row_sum(i),
                }
            })
            .collect();

        let n = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: ratio(classes.iter().map(|c| c.precision).sum(), n),
            recall: ratio(classes.iter().map(|c| c.recall).sum(), n),
            f1: ratio(classes.iter().map(|c| c.f1).sum(), n),
        };

        let weight = |f: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| f(c) * c.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = AverageMetrics {
            precision: weight(|c| c.precision),
            recall: weight(|c| c.recall),
            f1: weight(|c| c.f1),
        };

        Self {
            accuracy: ratio(matrix.correct() as f64, total as f64),
            classes,
            macro_avg,
            weighted_avg,
            total,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                c.name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                label, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

/// 在带标签的目录（`<root>/<class>/<image>`）上评估分类器
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub class_names: Vec<String>,
    pub matrix: ConfusionMatrix,
    /// 预处理或推理失败的图片数
    pub failed: usize,
    /// 预测到类别映射之外的索引
    pub unmatched: usize,
}

impl Evaluation {
    pub fn report(&self) -> ClassificationReport {
        ClassificationReport::from_matrix(&self.matrix, &self.class_names)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Classification Report:")?;
        writeln!(f, "{}", self.report())?;
        writeln!(f, "Confusion Matrix (rows = actual, columns = predicted):")?;

        let width = self.class_names.iter().map(|n| n.len()).max().unwrap_or(1).max(6);
        write!(f, "{:>width$}", "")?;
        for name in &self.class_names {
            write!(f, " {:>width$}", name)?;
        }
        writeln!(f)?;
        for (i, name) in self.class_names.iter().enumerate() {
            write!(f, "{:>width$}", name)?;
            for j in 0..self.matrix.size() {
                write!(f, " {:>width$}", self.matrix.get(i, j))?;
            }
            writeln!(f)?;
        }

        if self.failed > 0 || self.unmatched > 0 {
            writeln!(f, "Failed images: {}, unmatched predictions: {}", self.failed, self.unmatched)?;
        }
        Ok(())
    }
}

pub fn evaluate_directory(
    models: &ModelManager,
    preprocessor: &ImagePreprocessor,
    root: &Path,
) -> Result<Evaluation> {
    if !root.is_dir() {
        return Err(SkinError::InvalidInput(format!(
            "Evaluation directory not found: {}",
            root.display()
        )));
    }

    // 矩阵位置按类别索引升序排列
    let class_map = models.class_map();
    let indices: Vec<usize> = class_map.iter().map(|(idx, _)| idx).collect();
    let class_names: Vec<String> = class_map.iter().map(|(_, l)| l.to_string()).collect();
    let position = |index: usize| indices.iter().position(|&i| i == index);

    let mut matrix = ConfusionMatrix::new(class_names.len());
    let mut failed = 0;
    let mut unmatched = 0;

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let dir_name = entry.file_name().to_string_lossy().to_string();
        let Some(actual) = class_map.index_of(&dir_name).and_then(position) else {
            tracing::warn!("Skipping directory with unknown class: {}", dir_name);
            continue;
        };

        let scanner = ImageScanner::new(entry.path(), false)?;
        for path in scanner.iter() {
            let prediction = preprocessor
                .preprocess_path(&path)
                .and_then(|batch| models.predict(batch));

            match prediction {
                Ok(prediction) => match position(prediction.class_index) {
                    Some(predicted) => {
                        matrix.add(actual, predicted);
                    }
                    None => {
                        tracing::warn!(
                            "Prediction index {} for {} is not in the class map",
                            prediction.class_index,
                            path.display()
                        );
                        unmatched += 1;
                    }
                },
                Err(e) => {
                    tracing::error!("Error processing '{}': {}", path.display(), e);
                    failed += 1;
                }
            }
        }
    }

    tracing::info!(
        "Evaluation completed: evaluated={}, failed={}, unmatched={}",
        matrix.total(),
        failed,
        unmatched
    );

    Ok(Evaluation {
        class_names,
        matrix,
        failed,
        unmatched,
    })
}
