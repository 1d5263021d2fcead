pub mod loader;
pub mod preprocessing;
pub mod scanner;

pub use loader::{ImageLoader, SUPPORTED_EXTENSIONS};
pub use preprocessing::{ImagePreprocessor, PreprocessOptions};
pub use scanner::ImageScanner;
