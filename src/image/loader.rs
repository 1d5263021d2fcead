use crate::utils::error::SkinError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, RgbImage};
use std::path::Path;

/// 允许的图片扩展名（大小写不敏感）
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub struct ImageLoader;

impl ImageLoader {
    /// 从文件路径加载图像；优先按文件内容识别格式，识别不出时按扩展名
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| SkinError::ImageDecode(ImageError::IoError(e)))?;
        let image = reader.decode()?;
        Self::validate_dimensions(&image)?;
        Ok(image)
    }

    /// 按扩展名判断是否为待处理的图片
    pub fn is_supported_path(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SUPPORTED_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            })
            .unwrap_or(false)
    }

    /// 转换为固定的3通道RGB
    pub fn to_rgb(image: &DynamicImage) -> RgbImage {
        image.to_rgb8()
    }

    fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(SkinError::ImageProcessing(format!(
                "Image has empty dimensions: {}x{}",
                width, height
            )));
        }
        Ok(())
    }
}
