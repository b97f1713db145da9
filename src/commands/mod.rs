//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `models/`, `settings.rs`, `utils/`
//! - 子模块: scan, edit, run, batch, settings

pub mod batch;
pub mod edit;
pub mod run;
pub mod scan;
pub mod settings;

use crate::cli::Commands;
use crate::error::Result;
use crate::settings::Settings;

use std::path::Path;

/// 执行命令
pub fn run(cmd: Commands, settings_path: &Path) -> Result<()> {
    let mut settings = Settings::load(settings_path);

    match cmd {
        Commands::Scan(args) => scan::execute(args, &mut settings),
        Commands::Edit(args) => edit::execute(args),
        Commands::Run(args) => run::execute(args, &mut settings),
        Commands::Batch(args) => batch::execute(args, &mut settings),
        Commands::Settings(args) => settings::execute(args, &mut settings),
    }
}
