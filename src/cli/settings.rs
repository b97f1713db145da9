//! # settings 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/settings.rs`

use clap::Args;

/// settings 子命令参数
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Store a value, e.g. `--set mpt_lib=/opt/mpthub`
    #[arg(long, value_name = "KEY=VALUE")]
    pub set: Option<String>,
}
