//! # edit 子命令 CLI 定义
//!
//! 覆盖运行计划中单个文件的参数
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/edit.rs`

use clap::Args;
use std::path::PathBuf;

/// edit 子命令参数
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Run plan to modify in place
    #[arg(long)]
    pub plan: PathBuf,

    /// Item to edit: row number from `scan`, a path (or its trailing part), or a file name
    #[arg(long, value_name = "ROW|PATH|NAME")]
    pub file: String,

    /// Parameter override, e.g. `--set delta_t=20` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
    pub assignments: Vec<String>,
}
