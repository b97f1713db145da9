//! # 数据文件扫描器
//!
//! 递归遍历数据目录，收集轨迹数据文件并与尺寸表关联。
//!
//! ## 功能
//! - 扩展名匹配（不区分大小写）
//! - 文件夹标签：尺寸表中作为所在目录路径子串出现的最长标签，
//!   未命中时使用直接父目录名
//! - 尺寸：按文件夹标签精确查找，未命中为 0.0
//! - 结果按文件夹标签排序，同标签按路径排序
//! - 不可读的子目录记录警告后跳过，根目录不可读时报错
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 调用
//! - 使用 `models/size_table.rs`
//! - 使用 `walkdir` 遍历目录

use crate::error::{BatchError, Result};
use crate::models::{InventoryEntry, SizeTable};

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 默认数据文件扩展名
pub const DEFAULT_EXTENSION: &str = "csv";

/// 数据文件扫描器
pub struct FileScanner {
    /// 数据根目录
    root: PathBuf,
    /// 目标扩展名（小写，不含点）
    extension: String,
}

impl FileScanner {
    /// 创建新的扫描器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// 设置目标扩展名
    pub fn with_extension(mut self, extension: &str) -> Self {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() {
            self.extension = ext;
        }
        self
    }

    /// 扫描并返回按文件夹标签排序的条目列表
    pub fn scan(&self, sizes: &SizeTable) -> Result<Vec<InventoryEntry>> {
        if !self.root.is_dir() {
            return Err(BatchError::DirectoryNotFound {
                path: self.root.display().to_string(),
            });
        }

        let root = self
            .root
            .canonicalize()
            .map_err(|e| BatchError::FileReadError {
                path: self.root.display().to_string(),
                source: e,
            })?;

        let mut entries = Vec::new();

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                // 根目录以下不可读的子目录只跳过
                Err(e) if e.depth() > 0 => {
                    warn!(
                        "Skipping unreadable path {}: {}",
                        e.path().unwrap_or(&root).display(),
                        e
                    );
                    continue;
                }
                Err(e) => {
                    return Err(BatchError::DirectoryWalkError {
                        path: e.path().unwrap_or(&root).display().to_string(),
                        reason: e.to_string(),
                    })
                }
            };

            let path = entry.path();
            if !path.is_file() || !self.matches_extension(path) {
                continue;
            }

            entries.push(Self::make_entry(path, &root, sizes));
        }

        entries.sort_by(|a, b| {
            a.folder_name
                .cmp(&b.folder_name)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });

        info!(
            "Scanned {}: {} data files, {} size labels",
            root.display(),
            entries.len(),
            sizes.len()
        );

        Ok(entries)
    }

    /// 检查扩展名
    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase() == self.extension)
            .unwrap_or(false)
    }

    /// 为单个文件构造条目
    fn make_entry(path: &Path, root: &Path, sizes: &SizeTable) -> InventoryEntry {
        let dir = path.parent().unwrap_or(root);

        let folder_name = match sizes.match_folder(&dir.to_string_lossy()) {
            Some(label) => label.to_string(),
            None => dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        };

        let size = sizes.get(&folder_name).unwrap_or(0.0);
        debug!("{} -> folder '{}', size {}", path.display(), folder_name, size);

        InventoryEntry {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            folder_name,
            size,
            file_path: path.to_path_buf(),
        }
    }
}

/// 使用默认扩展名扫描目录
pub fn scan(root: &Path, sizes: &SizeTable) -> Result<Vec<InventoryEntry>> {
    FileScanner::new(root).scan(sizes)
}
