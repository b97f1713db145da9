//! # 单项执行器
//!
//! 对每个作业执行一次外部分析，并把单项失败限制在该项之内。
//!
//! ## 单项流程
//! 1. 数据文件不存在 → 跳过（记录日志，不发进度）
//! 2. 创建输出目录 `<文件所在目录>/<文件名去扩展名>`
//! 3. 构造分析配置（参数转换、帧率推导）
//! 4. 在隔离环境中：加载 → [校验] → [追踪] → 导出 → 清空结果缓冲
//!
//! 任一步骤出错或 panic 都只记为该项失败，批处理继续。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 使用 `engine/` 接口、`batch/isolation.rs`、`batch/progress.rs`

use super::isolation::IsolationGuard;
use super::progress::Reporter;
use crate::engine::{AnalysisConfig, AnalysisLibrary, ExportTarget};
use crate::error::{BatchError, Result};
use crate::models::JobDescriptor;

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::error;

/// 单项处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// 数据文件不存在，已跳过
    SkippedMissingFile,
    /// 处理成功
    Succeeded,
    /// 处理失败（原因）
    Failed(String),
}

/// 批处理结果统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// 记录单项结果
    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::SkippedMissingFile => self.skipped += 1,
            ItemOutcome::Succeeded => self.succeeded += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// 单项执行器
pub struct BatchExecutor<'a> {
    library: &'a dyn AnalysisLibrary,
    library_root: &'a Path,
    reporter: &'a Reporter,
    silence_streams: bool,
}

impl<'a> BatchExecutor<'a> {
    pub fn new(
        library: &'a dyn AnalysisLibrary,
        library_root: &'a Path,
        reporter: &'a Reporter,
    ) -> Self {
        Self {
            library,
            library_root,
            reporter,
            silence_streams: true,
        }
    }

    /// 外部调用期间是否静默标准流
    pub fn silence_streams(mut self, silence: bool) -> Self {
        self.silence_streams = silence;
        self
    }

    /// 按顺序处理全部作业
    pub fn run_all(&self, jobs: &[JobDescriptor]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for job in jobs {
            summary.record(&self.run_item(job));
        }
        summary
    }

    /// 处理单个作业
    pub fn run_item(&self, job: &JobDescriptor) -> ItemOutcome {
        let path = &job.file_path;
        if !path.exists() {
            error!("File not found, skipping: {}", path.display());
            return ItemOutcome::SkippedMissingFile;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| job.file_name.clone());

        self.reporter.line(format!("Processing {}...", name));

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process(job)))
            .unwrap_or_else(|payload| Err(BatchError::Other(panic_message(payload.as_ref()))));

        match result {
            Ok(()) => {
                self.reporter.line("   Done");
                ItemOutcome::Succeeded
            }
            Err(e) => {
                self.reporter.line(format!("   Error in {}: {}", name, e));
                ItemOutcome::Failed(e.to_string())
            }
        }
    }

    fn process(&self, job: &JobDescriptor) -> Result<()> {
        let dest = output_dir(&job.file_path);
        fs::create_dir_all(&dest).map_err(|e| BatchError::FileWriteError {
            path: dest.display().to_string(),
            source: e,
        })?;

        // 隔离期间工作目录会改变，相对路径需先解析
        let dest = fs::canonicalize(&dest).unwrap_or(dest);
        let report = fs::canonicalize(&job.file_path).unwrap_or_else(|_| job.file_path.clone());

        let config = AnalysisConfig::from_job(job)?;
        let mut analysis = self.library.new_analysis(&config)?;

        let _guard = IsolationGuard::acquire(self.library_root, self.silence_streams)?;

        analysis.load_reports(std::slice::from_ref(&report))?;
        if let Some(validation) = analysis.trajectory_validation() {
            validation.validate_trajectories()?;
        }
        if let Some(tracking) = analysis.tracking() {
            tracking.compute_trajectories()?;
        }
        analysis.export(&ExportTarget::new(dest))?;
        analysis.clear_results();

        Ok(())
    }
}

/// 单项输出目录：与数据文件同级、以文件名（去扩展名）命名
pub fn output_dir(file_path: &Path) -> PathBuf {
    let parent = file_path.parent().unwrap_or_else(|| Path::new("."));
    match file_path.file_stem() {
        Some(stem) => parent.join(stem),
        None => parent.join("output"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("analysis panicked: {}", detail)
}
