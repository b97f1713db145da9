//! # scan 子命令 CLI 定义
//!
//! 扫描数据目录、关联尺寸表并生成运行计划
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 和 `cli/batch.rs` 使用
//! - 参数传递给 `commands/scan.rs`

use crate::models::DefaultParams;

use clap::Args;
use std::path::PathBuf;

/// scan 子命令参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Size table: CSV or Excel workbook (label, size; first row is a header)
    #[arg(long)]
    pub sizes: PathBuf,

    /// Root folder containing the tracking data files
    #[arg(long)]
    pub data: PathBuf,

    /// Data file extension (case-insensitive)
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Write the run plan to this JSON file
    #[arg(long)]
    pub plan: Option<PathBuf>,

    #[command(flatten)]
    pub params: ParamArgs,
}

/// 默认分析参数
#[derive(Args, Debug, Clone)]
pub struct ParamArgs {
    /// Sampling interval in ms
    #[arg(long, default_value_t = 33.33)]
    pub delta_t: f64,

    /// Minimum trajectory length in frames
    #[arg(long, default_value_t = 30.0)]
    pub filter: f64,

    /// Total number of frames
    #[arg(long, default_value_t = 400.0)]
    pub frames: f64,

    /// Frame width in pixels
    #[arg(long, default_value_t = 512.0)]
    pub width_px: f64,

    /// Frame width in µm
    #[arg(long, default_value_t = 318.2)]
    pub width_um: f64,

    /// Analysis duration in seconds
    #[arg(long, default_value_t = 13.33)]
    pub analysis_time: f64,

    /// Temperature in °C
    #[arg(long, default_value_t = 25.0)]
    pub temperature: f64,
}

impl From<&ParamArgs> for DefaultParams {
    fn from(args: &ParamArgs) -> Self {
        DefaultParams {
            delta_t: args.delta_t,
            filter: args.filter,
            frames: args.frames,
            width_px: args.width_px,
            width_um: args.width_um,
            analysis_time: args.analysis_time,
            temperature: args.temperature,
        }
    }
}
