//! Enumerates image files under a root directory.

use crate::image::ImageLoader;
use crate::utils::error::SkinError;
use crate::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct ImageScanner {
    root: PathBuf,
    recursive: bool,
}

impl ImageScanner {
    /// 根目录必须存在且为目录，否则整个运行中止
    pub fn new(root: impl Into<PathBuf>, recursive: bool) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SkinError::InvalidInput(format!(
                "Image directory not found or not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root, recursive })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// 惰性遍历；每次调用都从头开始。顺序即目录遍历顺序，不做排序。
    pub fn iter(&self) -> impl Iterator<Item = PathBuf> {
        let mut walker = WalkDir::new(&self.root).min_depth(1);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        walker.into_iter().filter_map(|entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    return None;
                }
            };
            accept_entry(entry)
        })
    }
}

fn accept_entry(entry: DirEntry) -> Option<PathBuf> {
    if entry.file_type().is_dir() {
        return None;
    }

    let path = entry.into_path();
    if ImageLoader::is_supported_path(&path) {
        Some(path)
    } else {
        tracing::debug!("Skipping non-image file: {}", path.display());
        None
    }
}
