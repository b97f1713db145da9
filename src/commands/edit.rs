//! # edit 命令实现
//!
//! 覆盖运行计划中单个文件的参数并写回。
//!
//! ## 依赖关系
//! - 使用 `cli/edit.rs` 定义的参数
//! - 使用 `models/plan.rs`
//! - 使用 `utils/output.rs`

use crate::cli::edit::EditArgs;
use crate::error::Result;
use crate::models::RunRequest;
use crate::utils::output;

/// 执行 edit 命令
pub fn execute(args: EditArgs) -> Result<()> {
    let mut plan = RunRequest::load(&args.plan)?;

    let item = plan.select_item_mut(&args.file)?;
    let label = item.file_path.display().to_string();

    for assignment in &args.assignments {
        item.apply_override(assignment)?;
    }

    plan.save(&args.plan)?;
    output::print_success(&format!(
        "Updated {} parameter(s) for '{}'",
        args.assignments.len(),
        label
    ));

    Ok(())
}
