//! # 分析库路径
//!
//! - 规范化用户给出的库路径：转为绝对路径，指向内部 `mpt` 包目录时上移一级
//! - 记录进程内的库搜索路径
//!
//! 搜索路径每个进程只配置一次且不撤销。之后以不同路径运行时仍沿用第一次的路径，
//! 需要切换分析库时请在新进程中运行。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用

use crate::error::{BatchError, Result};

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// 分析库的包目录名
pub const PACKAGE_DIR: &str = "mpt";

/// 规范化库路径
///
/// 相对路径按当前工作目录解析。外部调用期间工作目录会切换到库目录，
/// 因此之后使用的必须是绝对路径。
pub fn normalize_library_path(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BatchError::LibraryPathMissing);
    }

    let path = std::path::absolute(raw).map_err(|e| BatchError::LibraryImport {
        path: raw.to_string(),
        reason: format!("cannot resolve path: {}", e),
    })?;
    if path.file_name().map(|n| n == PACKAGE_DIR).unwrap_or(false) {
        if let Some(parent) = path.parent() {
            return Ok(parent.to_path_buf());
        }
    }

    Ok(path)
}

/// 进程级库搜索路径
pub struct ImportPath {
    root: Mutex<Option<PathBuf>>,
}

static GLOBAL_IMPORT_PATH: ImportPath = ImportPath::new();

impl ImportPath {
    pub const fn new() -> Self {
        Self {
            root: Mutex::new(None),
        }
    }

    /// 进程全局实例
    pub fn global() -> &'static ImportPath {
        &GLOBAL_IMPORT_PATH
    }

    /// 登记库根目录，返回实际生效的目录
    pub fn register(&self, root: &Path) -> PathBuf {
        let mut slot = self.root.lock().unwrap_or_else(PoisonError::into_inner);

        match slot.as_ref() {
            Some(existing) if existing != root => {
                warn!(
                    "Library already configured at {}, ignoring {} for this process",
                    existing.display(),
                    root.display()
                );
                existing.clone()
            }
            Some(existing) => existing.clone(),
            None => {
                info!("Library search path set to {}", root.display());
                *slot = Some(root.to_path_buf());
                root.to_path_buf()
            }
        }
    }

    /// 当前已登记的目录
    pub fn current(&self) -> Option<PathBuf> {
        self.root
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ImportPath {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_package_dir() {
        assert_eq!(
            normalize_library_path("/opt/lib/mpt").unwrap(),
            PathBuf::from("/opt/lib")
        );
        assert_eq!(
            normalize_library_path("/opt/lib/mpt/").unwrap(),
            PathBuf::from("/opt/lib")
        );
    }

    #[test]
    fn test_normalize_keeps_root() {
        assert_eq!(
            normalize_library_path(" /opt/mpthub ").unwrap(),
            PathBuf::from("/opt/mpthub")
        );
    }

    #[test]
    fn test_normalize_relative_becomes_absolute() {
        let lib = normalize_library_path("lib").unwrap();
        assert!(lib.is_absolute());
        assert!(lib.ends_with("lib"));

        let inner = normalize_library_path("lib/mpt").unwrap();
        assert!(inner.is_absolute());
        assert!(inner.ends_with("lib"));

        let bare = normalize_library_path("mpt").unwrap();
        assert!(bare.is_absolute());
        assert_ne!(bare.file_name().and_then(|n| n.to_str()), Some(PACKAGE_DIR));
    }

    #[test]
    fn test_normalize_empty_fails() {
        assert!(matches!(
            normalize_library_path("   "),
            Err(BatchError::LibraryPathMissing)
        ));
    }

    #[test]
    fn test_import_path_first_registration_wins() {
        let paths = ImportPath::new();
        assert_eq!(paths.current(), None);

        assert_eq!(paths.register(Path::new("/a")), PathBuf::from("/a"));
        assert_eq!(paths.register(Path::new("/a")), PathBuf::from("/a"));
        assert_eq!(paths.register(Path::new("/b")), PathBuf::from("/a"));
        assert_eq!(paths.current(), Some(PathBuf::from("/a")));
    }
}
