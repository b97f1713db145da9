//! # batch 子命令 CLI 定义
//!
//! 扫描后立即执行，等价于 `scan` + `run`
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::run::EngineArgs;
use super::scan::ScanArgs;

use clap::Args;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    #[command(flatten)]
    pub engine: EngineArgs,
}
