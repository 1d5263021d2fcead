pub mod batch;
pub mod config;
pub mod image;
pub mod models;
pub mod report;
pub mod utils;

// 重新导出主要类型
pub use config::{BatchOptions, Config, TensorLayout};
pub use utils::error::SkinError;

pub type Result<T> = std::result::Result<T, SkinError>;
