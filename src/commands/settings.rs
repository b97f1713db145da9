//! # settings 命令实现
//!
//! 查看或修改持久化设置。
//!
//! ## 依赖关系
//! - 使用 `cli/settings.rs` 定义的参数
//! - 使用 `settings.rs`

use crate::cli::settings::SettingsArgs;
use crate::error::{BatchError, Result};
use crate::settings::Settings;
use crate::utils::output;

use colored::Colorize;

/// 执行 settings 命令
pub fn execute(args: SettingsArgs, settings: &mut Settings) -> Result<()> {
    if let Some(ref assignment) = args.set {
        let (key, value) = parse_assignment(assignment)?;
        settings.set(key, value)?;
        output::print_success(&format!("{} = {}", key, value));
        return Ok(());
    }

    output::print_header(&format!("Settings ({})", settings.path().display()));
    for (key, value) in settings.values() {
        println!("  {:<12} {}", key.bold(), value);
    }

    Ok(())
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value.trim())),
        _ => Err(BatchError::InvalidArgument(format!(
            "Expected key=value, got '{}'",
            assignment
        ))),
    }
}
