//! # 后台批处理执行
//!
//! 在独立的后台线程上执行整个批处理，调用线程不被阻塞。
//!
//! ## 流程
//! 1. 规范化库路径；为空时报告致命错误
//! 2. 登记库搜索路径并导入分析库；失败时报告致命错误
//! 3. 按计划顺序逐项执行（不并行、不重试）
//! 4. 发送汇总行，最后调用一次完成回调
//!
//! ## 依赖关系
//! - 被 `commands/run.rs` 调用
//! - 使用 `batch/executor.rs` 执行单项
//! - 使用 `engine/library_path.rs` 处理库路径

use super::executor::{BatchExecutor, BatchSummary};
use super::progress::{BatchEvent, ChannelSink, ProgressSink, Reporter};
use crate::engine::{normalize_library_path, AnalysisBackend, ImportPath};
use crate::error::{BatchError, Result};
use crate::models::RunRequest;

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// 运行选项
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// 外部调用期间是否静默标准流
    pub silence_streams: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            silence_streams: true,
        }
    }
}

/// 后台批处理句柄
pub struct RunHandle {
    thread: JoinHandle<()>,
}

impl RunHandle {
    /// 后台线程是否已结束
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// 等待后台线程结束
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| BatchError::Other("Batch worker panicked".to_string()))
    }
}

/// 在后台线程启动批处理
///
/// 进度行发往 `sink`；批处理结束后（无论单项成败）调用一次 `on_done`。
pub fn spawn_batch<F>(
    request: RunRequest,
    backend: Arc<dyn AnalysisBackend>,
    sink: Arc<dyn ProgressSink>,
    options: RunOptions,
    on_done: F,
) -> Result<RunHandle>
where
    F: FnOnce() + Send + 'static,
{
    let thread = thread::Builder::new()
        .name("mpt-batch-worker".to_string())
        .spawn(move || {
            let reporter = Reporter::new(sink);
            let finished = panic::catch_unwind(AssertUnwindSafe(|| {
                run_batch(&request, backend.as_ref(), &reporter, options)
            }));
            if finished.is_err() {
                error!("Batch worker stopped by a panic");
                reporter.line("Error: batch stopped unexpectedly.");
            }
            on_done();
        })
        .map_err(|e| BatchError::Other(format!("Cannot start batch worker: {}", e)))?;

    Ok(RunHandle { thread })
}

/// 启动批处理，进度与完成信号通过通道返回
///
/// `BatchEvent::Done` 总是最后一个事件。
pub fn spawn_batch_with_events(
    request: RunRequest,
    backend: Arc<dyn AnalysisBackend>,
    options: RunOptions,
) -> Result<(RunHandle, Receiver<BatchEvent>)> {
    let (tx, rx) = mpsc::channel();
    let done_tx = tx.clone();

    let handle = spawn_batch(
        request,
        backend,
        Arc::new(ChannelSink::new(tx)),
        options,
        move || {
            let _ = done_tx.send(BatchEvent::Done);
        },
    )?;

    Ok((handle, rx))
}

/// 在当前线程执行批处理
///
/// 致命错误（库路径缺失、库导入失败）只报告一次并返回 `None`。
pub fn run_batch(
    request: &RunRequest,
    backend: &dyn AnalysisBackend,
    reporter: &Reporter,
    options: RunOptions,
) -> Option<BatchSummary> {
    let root = match normalize_library_path(&request.library_path) {
        Ok(root) => root,
        Err(e) => {
            reporter.line(format!("Error: {}.", e));
            return None;
        }
    };
    let root = ImportPath::global().register(&root);

    let library = match backend.open(&root) {
        Ok(library) => library,
        Err(e) => {
            reporter.line(format!("Error: {}", e));
            return None;
        }
    };

    reporter.line(format!("--- Processing {} files ---", request.items.len()));

    let summary = BatchExecutor::new(library.as_ref(), &root, reporter)
        .silence_streams(options.silence_streams)
        .run_all(&request.items);

    info!(
        "Batch finished: {} items, {} succeeded, {} skipped, {} failed",
        summary.total(),
        summary.succeeded,
        summary.skipped,
        summary.failed
    );
    reporter.line(format!(
        "All tasks completed: {} succeeded, {} skipped, {} failed.",
        summary.succeeded, summary.skipped, summary.failed
    ));

    Some(summary)
}
