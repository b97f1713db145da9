//! # scan 命令实现
//!
//! 扫描数据目录，关联尺寸表并生成运行计划。
//!
//! ## 功能
//! - 读取尺寸表
//! - 递归扫描数据文件
//! - 将扫描结果与默认参数合并为作业列表
//! - 终端表格显示，可选写出 JSON 运行计划
//! - 记住最近使用的目录
//!
//! ## 依赖关系
//! - 使用 `cli/scan.rs` 定义的参数
//! - 使用 `parsers/size_table.rs`, `batch/scanner.rs`
//! - 使用 `utils/output.rs`

use crate::batch::FileScanner;
use crate::cli::scan::ScanArgs;
use crate::error::Result;
use crate::models::{DefaultParams, JobDescriptor, ParamKey, RunRequest};
use crate::parsers::read_size_table;
use crate::settings::{Settings, KEY_LAST_DATA, KEY_LAST_SIZES, KEY_LIBRARY};
use crate::utils::output;

use tabled::{Table, Tabled};
use tracing::warn;

/// 计划表格行
#[derive(Debug, Clone, Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    row: usize,
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Folder")]
    folder: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "delta_t")]
    delta_t: String,
    #[tabled(rename = "filter")]
    filter: String,
}

/// 执行 scan 命令
pub fn execute(args: ScanArgs, settings: &mut Settings) -> Result<()> {
    let request = build_plan(&args, settings)?;

    if let Some(ref plan_path) = args.plan {
        request.save(plan_path)?;
        output::print_success(&format!("Run plan saved to '{}'", plan_path.display()));
    }

    Ok(())
}

/// 扫描并合并，返回运行计划
///
/// 计划的库路径取自设置中的 `mpt_lib`。
pub fn build_plan(args: &ScanArgs, settings: &mut Settings) -> Result<RunRequest> {
    output::print_header("Scanning Data Files");

    let sizes = read_size_table(&args.sizes)?;
    output::print_info(&format!(
        "Loaded {} size labels from '{}'",
        sizes.len(),
        args.sizes.display()
    ));

    let entries = FileScanner::new(&args.data)
        .with_extension(&args.extension)
        .scan(&sizes)?;

    let defaults = DefaultParams::from(&args.params);
    let items: Vec<JobDescriptor> = entries
        .iter()
        .map(|entry| JobDescriptor::from_entry(entry, &defaults))
        .collect();

    if items.is_empty() {
        output::print_warning(&format!(
            "No .{} files found under '{}'",
            args.extension.trim_start_matches('.'),
            args.data.display()
        ));
    } else {
        let rows: Vec<PlanRow> = items
            .iter()
            .enumerate()
            .map(|(index, job)| plan_row(index + 1, job))
            .collect();
        println!("{}", Table::new(&rows));
    }
    output::print_info(&format!("Found {} files.", items.len()));

    remember_dirs(args, settings);

    Ok(RunRequest::new(settings.get(KEY_LIBRARY), items))
}

fn plan_row(row: usize, job: &JobDescriptor) -> PlanRow {
    let show = |key: ParamKey| match job.param(key) {
        Ok(v) => format!("{}", v),
        Err(_) => "?".to_string(),
    };

    PlanRow {
        row,
        file: job.file_name.clone(),
        folder: job.folder_name.clone(),
        size: show(ParamKey::Size),
        delta_t: show(ParamKey::DeltaT),
        filter: show(ParamKey::Filter),
    }
}

/// 记住最近使用的尺寸表目录与数据目录，失败只警告
fn remember_dirs(args: &ScanArgs, settings: &mut Settings) {
    let sizes_dir = args
        .sizes
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let data_dir = args.data.display().to_string();

    for (key, value) in [(KEY_LAST_SIZES, sizes_dir), (KEY_LAST_DATA, data_dir)] {
        if let Err(e) = settings.set(key, &value) {
            warn!("Could not remember {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::scan::ParamArgs;
    use crate::settings::SETTINGS_FILE;
    use std::fs;
    use std::path::Path;

    fn params() -> ParamArgs {
        ParamArgs {
            delta_t: 20.0,
            filter: 30.0,
            frames: 400.0,
            width_px: 512.0,
            width_um: 318.2,
            analysis_time: 13.33,
            temperature: 25.0,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_plan_merges_and_remembers() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = dir.path().join("meta").join("sizes.csv");
        write(&sizes, "label,size\nPS100,100\nPS500,500\n");
        let data = dir.path().join("data");
        write(&data.join("PS500").join("b.csv"), "");
        write(&data.join("PS100").join("a.CSV"), "");
        write(&data.join("PS100").join("notes.txt"), "");

        let mut settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        settings.set(KEY_LIBRARY, "/opt/mpthub").unwrap();

        let args = ScanArgs {
            sizes: sizes.clone(),
            data: data.clone(),
            extension: "csv".to_string(),
            plan: None,
            params: params(),
        };
        let plan = build_plan(&args, &mut settings).unwrap();

        assert_eq!(plan.library_path, "/opt/mpthub");
        assert_eq!(plan.items.len(), 2);
        assert_eq!(plan.items[0].folder_name, "PS100");
        assert_eq!(plan.items[0].param(ParamKey::Size).unwrap(), 100.0);
        assert_eq!(plan.items[1].param(ParamKey::DeltaT).unwrap(), 20.0);

        let reloaded = Settings::load(settings.path());
        assert_eq!(
            reloaded.get(KEY_LAST_SIZES),
            dir.path().join("meta").display().to_string()
        );
        assert_eq!(reloaded.get(KEY_LAST_DATA), data.display().to_string());
    }

    #[test]
    fn test_execute_writes_plan() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = dir.path().join("sizes.csv");
        write(&sizes, "label,size\nPS100,100\n");
        let data = dir.path().join("data");
        write(&data.join("PS100").join("a.csv"), "");
        let plan_path = dir.path().join("plan.json");

        let mut settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        let args = ScanArgs {
            sizes,
            data,
            extension: ".csv".to_string(),
            plan: Some(plan_path.clone()),
            params: params(),
        };
        execute(args, &mut settings).unwrap();

        let plan = RunRequest::load(&plan_path).unwrap();
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.items[0].file_name, "a.csv");
    }

    #[test]
    fn test_build_plan_missing_sizes_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        let args = ScanArgs {
            sizes: dir.path().join("missing.csv"),
            data: dir.path().to_path_buf(),
            extension: "csv".to_string(),
            plan: None,
            params: params(),
        };

        assert!(build_plan(&args, &mut settings).is_err());
    }
}
