use crate::image::ImageLoader;
use crate::utils::error::SkinError;
use crate::{Config, Result, TensorLayout};
use image::{imageops, DynamicImage, RgbImage};
use ndarray::Array4;
use std::path::Path;

/// 锐化（unsharp mask）参数
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct PreprocessOptions {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub sharpen: bool,
}

impl PreprocessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.input.width,
            height: config.input.height,
            layout: config.input.layout,
            sharpen: false,
        }
    }

    pub fn with_sharpen(mut self, sharpen: bool) -> Self {
        self.sharpen = sharpen;
        self
    }
}

/// 解码 -> RGB -> (锐化) -> 拉伸缩放 -> [0,1]归一化 -> batch-of-one
pub struct ImagePreprocessor {
    options: PreprocessOptions,
}

impl ImagePreprocessor {
    pub fn new(options: PreprocessOptions) -> Result<Self> {
        if options.width == 0 || options.height == 0 {
            return Err(SkinError::Config(format!(
                "Resize target must be non-zero, got {}x{}",
                options.width, options.height
            )));
        }
        Ok(Self { options })
    }

    pub fn preprocess_path(&self, path: &Path) -> Result<Array4<f32>> {
        let image = ImageLoader::from_path(path)?;
        Ok(self.preprocess_image(&image))
    }

    pub fn preprocess_image(&self, image: &DynamicImage) -> Array4<f32> {
        let mut rgb = ImageLoader::to_rgb(image);
        if self.options.sharpen {
            rgb = imageops::unsharpen(&rgb, SHARPEN_SIGMA, SHARPEN_THRESHOLD);
        }

        // 不保持宽高比，直接拉伸到目标尺寸
        let resized = imageops::resize(
            &rgb,
            self.options.width,
            self.options.height,
            imageops::FilterType::CatmullRom,
        );

        Self::to_tensor(&resized, self.options.layout)
    }

    fn to_tensor(rgb: &RgbImage, layout: TensorLayout) -> Array4<f32> {
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);

        match layout {
            TensorLayout::Nhwc => Array4::from_shape_fn((1, height, width, 3), |(_, y, x, c)| {
                rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
            }),
            TensorLayout::Nchw => Array4::from_shape_fn((1, 3, height, width), |(_, c, y, x)| {
                rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
            }),
        }
    }
}
