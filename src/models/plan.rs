//! # 运行计划
//!
//! 图形界面/命令行与批处理核心之间的边界结构：
//! 分析库路径 + 有序作业列表。以 JSON 文件保存（`run_config.json` 布局）。
//!
//! ## 依赖关系
//! - 被 `commands/` 读写
//! - 被 `batch/runner.rs` 消费
//! - 使用 `models/job.rs`

use super::job::JobDescriptor;
use crate::error::{BatchError, Result};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 一次批处理运行请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// 分析库路径，可以指向库根目录或其内部的 `mpt` 包目录
    #[serde(default)]
    pub library_path: String,
    /// 按扫描顺序排列的作业
    #[serde(default)]
    pub items: Vec<JobDescriptor>,
}

impl RunRequest {
    pub fn new(library_path: impl Into<String>, items: Vec<JobDescriptor>) -> Self {
        RunRequest {
            library_path: library_path.into(),
            items,
        }
    }

    /// 从 JSON 文件读取运行计划
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BatchError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| BatchError::ParseError {
            format: "run plan".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// 写入 JSON 文件（缩进格式）
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| BatchError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 选择单个作业
    ///
    /// `selector` 可以是：
    /// - 从 1 开始的行号（与 `scan` 表格的 `#` 列一致）
    /// - 完整路径，或路径末尾的若干段（如 `PS500/run1.csv`）
    /// - 文件名
    ///
    /// 同时匹配多个作业时报错，不做猜测。
    pub fn select_item_mut(&mut self, selector: &str) -> Result<&mut JobDescriptor> {
        let selector = selector.trim();
        if selector.is_empty() {
            return Err(BatchError::InvalidArgument("Empty item selector".to_string()));
        }

        if let Ok(row) = selector.parse::<usize>() {
            let count = self.items.len();
            return row
                .checked_sub(1)
                .and_then(|index| self.items.get_mut(index))
                .ok_or_else(|| {
                    BatchError::InvalidArgument(format!(
                        "Row {} is out of range (plan has {} items)",
                        row, count
                    ))
                });
        }

        let matches: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                item.file_name == selector || item.file_path.ends_with(Path::new(selector))
            })
            .map(|(index, _)| index)
            .collect();

        match matches.as_slice() {
            [index] => Ok(&mut self.items[*index]),
            [] => Err(BatchError::InvalidArgument(format!(
                "'{}' is not in the run plan",
                selector
            ))),
            several => {
                let candidates: Vec<String> = several
                    .iter()
                    .map(|i| format!("#{} {}", i + 1, self.items[*i].file_path.display()))
                    .collect();
                Err(BatchError::InvalidArgument(format!(
                    "'{}' matches {} items ({}); use the row number or a longer path",
                    selector,
                    several.len(),
                    candidates.join(", ")
                )))
            }
        }
    }
}
