//! # 批处理模块
//!
//! 批处理编排核心。
//!
//! ## 功能
//! - 扫描数据目录并关联尺寸表
//! - 逐项隔离执行外部分析，单项失败不影响其他项
//! - 通过进度通道向调用方发送状态行
//! - 在后台线程执行整个批处理，结束时发出一次完成信号
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `engine/` 调用外部分析库
//! - 使用 `walkdir` 遍历目录

pub mod executor;
pub mod isolation;
pub mod progress;
pub mod runner;
pub mod scanner;

pub use executor::{BatchExecutor, BatchSummary, ItemOutcome};
pub use progress::{BatchEvent, ChannelSink, ProgressSink, Reporter};
pub use runner::{spawn_batch, spawn_batch_with_events, RunHandle, RunOptions};
pub use scanner::FileScanner;
