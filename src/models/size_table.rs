//! # 颗粒尺寸表
//!
//! 标签 → 颗粒尺寸的映射，由尺寸表文件解析得到，扫描期间只读。
//!
//! ## 依赖关系
//! - 被 `parsers/size_table.rs` 构建
//! - 被 `batch/scanner.rs` 用于文件夹标签匹配

use std::collections::BTreeMap;

/// 标签 → 尺寸映射
///
/// 标签存储时去除首尾空白并保留大小写；匹配文件夹路径时不区分大小写。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeTable {
    sizes: BTreeMap<String, f64>,
}

impl SizeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条记录，重复标签以后者为准
    pub fn insert(&mut self, label: &str, size: f64) {
        self.sizes.insert(label.trim().to_string(), size);
    }

    /// 按标签精确查找
    pub fn get(&self, label: &str) -> Option<f64> {
        self.sizes.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// 查找作为 `dir_path` 子串出现的标签（不区分大小写）
    ///
    /// 多个标签同时命中时取最长者，等长时取字典序最小者。
    pub fn match_folder(&self, dir_path: &str) -> Option<&str> {
        let haystack = dir_path.to_lowercase();

        self.sizes
            .keys()
            .filter(|label| !label.is_empty() && haystack.contains(&label.to_lowercase()))
            .fold(None, |best: Option<&String>, label| match best {
                Some(b) if b.len() >= label.len() => Some(b),
                _ => Some(label),
            })
            .map(String::as_str)
    }
}

impl FromIterator<(String, f64)> for SizeTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut table = SizeTable::new();
        for (label, size) in iter {
            table.insert(&label, size);
        }
        table
    }
}
