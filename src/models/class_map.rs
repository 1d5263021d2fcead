use crate::utils::error::SkinError;
use crate::Result;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::{fmt, result};

/// 类别索引 -> 标签名
///
/// 训练时保存的是 `{label: index}`，加载时反转。反转前检查双射，
/// 重复的标签或索引直接报错，不做静默覆盖。
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    labels: BTreeMap<usize, String>,
}

impl ClassMap {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkinError::ClassMap(format!(
                "Class map not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading class map from: {}", path.display());

        let raw = fs::read_to_string(path).map_err(|e| {
            SkinError::ClassMap(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let LabelIndices(pairs) = serde_json::from_str(&raw).map_err(|e| {
            SkinError::ClassMap(format!("Malformed class map {}: {}", path.display(), e))
        })?;

        let map = Self::from_label_indices(pairs)?;
        tracing::info!("Class map loaded: {} classes", map.len());
        Ok(map)
    }

    /// 从 `{label: index}` 构建并反转
    pub fn from_label_indices<I>(label_indices: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut labels = BTreeMap::new();
        let mut seen = HashSet::new();

        for (label, index) in label_indices {
            if !seen.insert(label.clone()) {
                return Err(SkinError::ClassMap(format!(
                    "Duplicate class label '{}'",
                    label
                )));
            }
            if let Some(existing) = labels.insert(index, label.clone()) {
                return Err(SkinError::ClassMap(format!(
                    "Duplicate class index {}: '{}' and '{}'",
                    index, existing, label
                )));
            }
        }

        if labels.is_empty() {
            return Err(SkinError::ClassMap("Class map is empty".to_string()));
        }

        Ok(Self { labels })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    /// 查不到时退回原始索引的字符串形式
    pub fn label_for(&self, index: usize) -> String {
        self.get(index)
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string())
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(idx, _)| *idx)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 按索引升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(idx, label)| (*idx, label.as_str()))
    }
}

/// JSON对象按出现顺序保留全部键值对，重复的键交给双射检查处理
struct LabelIndices(Vec<(String, usize)>);

impl<'de> Deserialize<'de> for LabelIndices {
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = LabelIndices;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping labels to class indices")
            }

            fn visit_map<A>(self, mut map: A) -> result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, usize>()? {
                    pairs.push(pair);
                }
                Ok(LabelIndices(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
