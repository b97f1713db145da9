//! # mpt-batch - 多颗粒追踪分析批处理工具
//!
//! 扫描显微轨迹数据目录，按文件夹关联颗粒尺寸，
//! 逐个文件调用外部 MPT 分析库并导出结果。
//!
//! ## 子命令
//! - `scan`     - 扫描数据目录，生成运行计划
//! - `edit`     - 覆盖计划中单个文件的参数
//! - `run`      - 在后台执行运行计划
//! - `batch`    - 扫描并立即执行
//! - `settings` - 查看或修改持久化设置
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (尺寸表解析)
//!   │     ├── batch/     (扫描、隔离执行、进度通道、后台运行)
//!   │     ├── engine/    (外部分析库接口)
//!   │     └── models/    (数据模型)
//!   ├── settings.rs (持久化设置)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod engine;
mod error;
mod models;
mod parsers;
mod settings;
mod utils;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli
        .settings_file
        .clone()
        .unwrap_or_else(settings::default_settings_path);

    if let Err(e) = commands::run(cli.command, &settings_path) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

/// 日志输出到 stderr，RUST_LOG 优先于 `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
