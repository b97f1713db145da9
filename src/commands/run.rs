//! # run 命令实现
//!
//! 在后台线程执行运行计划，前台显示进度行。
//!
//! ## 功能
//! - 确定分析库目录（命令行 > 计划文件 > 设置）
//! - 启动后台批处理，前台逐行接收进度
//! - 收到完成信号后结束
//!
//! ## 依赖关系
//! - 使用 `cli/run.rs` 定义的参数
//! - 使用 `batch/runner.rs`, `engine/python.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{spawn_batch_with_events, BatchEvent, RunOptions};
use crate::cli::run::{EngineArgs, RunArgs};
use crate::engine::PythonBackend;
use crate::error::{BatchError, Result};
use crate::models::RunRequest;
use crate::settings::{Settings, KEY_LIBRARY};
use crate::utils::output::{self, Console};
use crate::utils::progress;

use std::sync::Arc;
use tracing::{info, warn};

/// 执行 run 命令
pub fn execute(args: RunArgs, settings: &mut Settings) -> Result<()> {
    let request = RunRequest::load(&args.plan)?;
    run_plan(request, &args.engine, settings)
}

/// 执行已加载的运行计划
pub fn run_plan(
    mut request: RunRequest,
    engine: &EngineArgs,
    settings: &mut Settings,
) -> Result<()> {
    request.library_path = resolve_library(engine, &request, settings)?;

    if let Some(ref library) = engine.library {
        if let Err(e) = settings.set(KEY_LIBRARY, library.trim()) {
            warn!("Could not remember library folder: {}", e);
        }
    }

    output::print_header("Running MPT Analysis");
    output::print_info(&format!("Library: {}", request.library_path));
    output::print_info(&format!("Interpreter: {}", engine.python));

    let total = request.items.len();
    let backend = Arc::new(PythonBackend::new(engine.python.clone()));
    let options = RunOptions {
        silence_streams: !engine.show_library_output,
    };

    let mut console = Console::detached();
    let (handle, rx) = spawn_batch_with_events(request, backend, options)?;
    info!("Batch of {} items started", total);

    let spinner = progress::create_spinner(&format!("Analyzing {} files", total));
    let mut finished = false;
    for event in rx.iter() {
        match event {
            BatchEvent::Progress(line) => spinner.suspend(|| console.progress_line(&line)),
            BatchEvent::Done => {
                finished = true;
                break;
            }
        }
    }
    spinner.finish_and_clear();

    handle.join()?;

    if finished {
        output::print_done("Batch analysis complete.");
    } else {
        output::print_warning("Batch worker stopped without a completion signal.");
    }

    Ok(())
}

/// 选择分析库目录：命令行参数 > 计划文件 > 设置
fn resolve_library(
    engine: &EngineArgs,
    request: &RunRequest,
    settings: &Settings,
) -> Result<String> {
    [
        engine.library.as_deref(),
        Some(request.library_path.as_str()),
        Some(settings.get(KEY_LIBRARY)),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|s| !s.is_empty())
    .map(str::to_string)
    .ok_or_else(|| {
        BatchError::InvalidArgument(
            "Set MPTHub library folder first (--library or `settings --set mpt_lib=<dir>`)"
                .to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SETTINGS_FILE;

    fn engine(library: Option<&str>) -> EngineArgs {
        EngineArgs {
            library: library.map(str::to_string),
            python: "python3".to_string(),
            show_library_output: false,
        }
    }

    #[test]
    fn test_resolve_library_prefers_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        settings.set(KEY_LIBRARY, "/from/settings").unwrap();
        let request = RunRequest::new("/from/plan", vec![]);

        let lib = resolve_library(&engine(Some(" /from/flag ")), &request, &settings).unwrap();
        assert_eq!(lib, "/from/flag");

        let lib = resolve_library(&engine(None), &request, &settings).unwrap();
        assert_eq!(lib, "/from/plan");

        let blank = RunRequest::new("  ", vec![]);
        let lib = resolve_library(&engine(None), &blank, &settings).unwrap();
        assert_eq!(lib, "/from/settings");
    }

    #[test]
    fn test_resolve_library_none_configured() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE));

        let empty = RunRequest::new("", vec![]);
        let err = resolve_library(&engine(None), &empty, &settings).unwrap_err();
        assert!(err.to_string().contains("Set MPTHub library folder first"));
    }
}
