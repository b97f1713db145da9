//! # run 子命令 CLI 定义
//!
//! 执行运行计划
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 和 `cli/batch.rs` 使用
//! - 参数传递给 `commands/run.rs`

use crate::engine::python::DEFAULT_PYTHON;

use clap::Args;
use std::path::PathBuf;

/// run 子命令参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run plan written by `scan`
    #[arg(long)]
    pub plan: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// 分析库相关参数
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// MPTHub library folder (the folder containing `mpt`, or `mpt` itself)
    #[arg(long, env = "MPT_LIBRARY")]
    pub library: Option<String>,

    /// Python interpreter used to drive the library
    #[arg(long, env = "MPT_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// Let the library write to this terminal instead of silencing it
    #[arg(long, default_value_t = false)]
    pub show_library_output: bool,
}
