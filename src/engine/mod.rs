//! # 外部分析引擎接口
//!
//! 批处理核心只依赖一组最小能力：
//! 创建分析对象、加载轨迹报告、导出结果、清空结果缓冲。
//! 轨迹校验与轨迹追踪是可选能力，不同版本的分析库不一定提供，
//! 调用前通过 `Analysis::trajectory_validation` / `Analysis::tracking` 探测。
//!
//! ## 依赖关系
//! - 被 `batch/executor.rs` 和 `batch/runner.rs` 使用
//! - 子模块: config, library_path, python

pub mod config;
pub mod library_path;
pub mod python;

pub use config::{AnalysisConfig, ExportTarget};
pub use library_path::{normalize_library_path, ImportPath};
pub use python::PythonBackend;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// 分析库后端：负责定位并导入分析库
pub trait AnalysisBackend: Send + Sync {
    /// 导入位于 `library_root` 的分析库
    ///
    /// 失败视为整个批处理的致命错误。
    fn open(&self, library_root: &Path) -> Result<Box<dyn AnalysisLibrary>>;
}

/// 已导入的分析库
pub trait AnalysisLibrary {
    /// 以给定配置创建新的分析对象
    fn new_analysis(&self, config: &AnalysisConfig) -> Result<Box<dyn Analysis>>;
}

/// 单次分析
pub trait Analysis {
    /// 加载轨迹报告文件
    fn load_reports(&mut self, files: &[PathBuf]) -> Result<()>;

    /// 轨迹校验能力（可选）
    fn trajectory_validation(&mut self) -> Option<&mut dyn TrajectoryValidation> {
        None
    }

    /// 轨迹追踪能力（可选）
    fn tracking(&mut self) -> Option<&mut dyn TrajectoryTracking> {
        None
    }

    /// 导出结果到目标目录
    fn export(&mut self, target: &ExportTarget) -> Result<()>;

    /// 清空内存中的结果缓冲
    fn clear_results(&mut self);
}

/// 筛选有效轨迹
pub trait TrajectoryValidation {
    fn validate_trajectories(&mut self) -> Result<()>;
}

/// 计算轨迹
pub trait TrajectoryTracking {
    fn compute_trajectories(&mut self) -> Result<()>;
}
