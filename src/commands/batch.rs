//! # batch 命令实现
//!
//! 扫描数据目录后立即执行生成的计划。
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `commands/scan.rs`, `commands/run.rs`

use super::{run, scan};
use crate::cli::batch::BatchArgs;
use crate::error::Result;
use crate::settings::Settings;
use crate::utils::output;

/// 执行 batch 命令
pub fn execute(args: BatchArgs, settings: &mut Settings) -> Result<()> {
    let request = scan::build_plan(&args.scan, settings)?;

    if let Some(ref plan_path) = args.scan.plan {
        request.save(plan_path)?;
        output::print_success(&format!("Run plan saved to '{}'", plan_path.display()));
    }

    if request.items.is_empty() {
        output::print_warning("Nothing to run.");
        return Ok(());
    }

    run::run_plan(request, &args.engine, settings)
}
