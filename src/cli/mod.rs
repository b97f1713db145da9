//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `scan`: 扫描数据目录，生成运行计划
//! - `edit`: 修改运行计划中单个文件的参数
//! - `run`: 执行运行计划
//! - `batch`: 扫描并立即执行
//! - `settings`: 查看或修改持久化设置
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: scan, edit, run, batch, settings

pub mod batch;
pub mod edit;
pub mod run;
pub mod scan;
pub mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mpt-batch - 多颗粒追踪分析批处理工具
#[derive(Parser)]
#[command(name = "mptbatch")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Batch runner for multiple-particle-tracking (MPT) analysis", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (defaults to app_settings.json next to the executable)
    #[arg(long, global = true, env = "MPT_SETTINGS")]
    pub settings_file: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Scan a data folder against a size table and write a run plan
    Scan(scan::ScanArgs),

    /// Override parameters of one file in a run plan
    Edit(edit::EditArgs),

    /// Run the analysis for every file in a run plan
    Run(run::RunArgs),

    /// Scan and run in one step
    Batch(batch::BatchArgs),

    /// Show or change persisted settings
    Settings(settings::SettingsArgs),
}
