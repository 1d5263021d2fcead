#![allow(dead_code)]

use image::{ImageBuffer, Rgb, RgbImage};
use ndarray::Array4;
use skin_classifier::models::{ClassMap, ImageClassifier, ModelManager};
use skin_classifier::{Config, Result, SkinError, TensorLayout};
use std::fs;
use std::path::Path;

/// 用像素亮度作为置信度：灰度 v 的图片得到 [v/255, 0.0]
pub struct BrightnessClassifier;

impl ImageClassifier for BrightnessClassifier {
    fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>> {
        Ok(vec![batch[[0, 0, 0, 0]], 0.0])
    }
}

/// 亮图判为第0类，暗图判为第1类
pub struct ThresholdClassifier;

impl ImageClassifier for ThresholdClassifier {
    fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>> {
        if batch[[0, 0, 0, 0]] > 0.5 {
            Ok(vec![0.9, 0.1])
        } else {
            Ok(vec![0.2, 0.8])
        }
    }
}

/// 暗图返回可恢复的推理错误，亮图返回不可恢复的配置错误
pub struct FailingClassifier;

impl ImageClassifier for FailingClassifier {
    fn predict(&self, batch: Array4<f32>) -> Result<Vec<f32>> {
        if batch[[0, 0, 0, 0]] > 0.5 {
            Err(SkinError::Config("session lost".to_string()))
        } else {
            Err(SkinError::Inference("bad output shape".to_string()))
        }
    }
}

pub fn test_config() -> Config {
    Config::new("unused.onnx", "unused.json", 8, 8, TensorLayout::Nhwc, Some(1)).unwrap()
}

pub fn class_map() -> ClassMap {
    ClassMap::from_label_indices(vec![("acne".to_string(), 0), ("eczema".to_string(), 1)]).unwrap()
}

pub fn manager(classifier: impl ImageClassifier + 'static) -> ModelManager {
    ModelManager::with_classifier(Box::new(classifier), class_map(), test_config())
}

/// 写一张 8x8 纯灰度PNG（与测试输入尺寸一致，缩放不改变像素）
pub fn write_gray(path: &Path, value: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img: RgbImage = ImageBuffer::from_pixel(8, 8, Rgb([value, value, value]));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

pub fn write_corrupt(path: &Path) {
    fs::write(path, b"this is not an image").unwrap();
}

pub fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
