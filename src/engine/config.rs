//! # 分析配置
//!
//! 由作业描述构造外部分析库所需的配置对象。
//! 字段名与 `mpt` 分析库的配置属性一致，序列化后直接传给桥接脚本。
//!
//! ## 依赖关系
//! - 被 `batch/executor.rs` 构造
//! - 被 `engine/python.rs` 序列化
//! - 使用 `models/job.rs`

use crate::error::{BatchError, Result};
use crate::models::{JobDescriptor, ParamKey};

use serde::Serialize;
use std::path::PathBuf;

/// 外部分析配置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// 颗粒尺寸
    pub p_size: f64,
    /// 采样间隔 (ms)
    pub delta_t: f64,
    /// 采集帧率，由采样间隔推导
    pub fps: f64,
    /// 最短轨迹帧数
    pub min_frames: f64,
    /// 总帧数
    pub total_frames: f64,
    /// 视野宽度 (px)
    pub width_px: f64,
    /// 视野宽度 (µm)
    pub width_si: f64,
    /// 分析时长 (s)
    pub time: f64,
    /// 温度 (°C)
    #[serde(rename = "temperature_C")]
    pub temperature_c: f64,
}

impl AnalysisConfig {
    /// 从作业描述构造配置
    pub fn from_job(job: &JobDescriptor) -> Result<Self> {
        let delta_t = job.param(ParamKey::DeltaT)?;

        Ok(AnalysisConfig {
            p_size: job.param(ParamKey::Size)?,
            delta_t,
            fps: acquisition_rate(delta_t)?,
            min_frames: job.param(ParamKey::Filter)?,
            total_frames: job.param(ParamKey::Frames)?,
            width_px: job.param(ParamKey::WidthPx)?,
            width_si: job.param(ParamKey::WidthUm)?,
            time: job.param(ParamKey::AnalysisTime)?,
            temperature_c: job.param(ParamKey::Temperature)?,
        })
    }
}

/// 采集帧率 = 1000 / 采样间隔(ms)
pub fn acquisition_rate(delta_t: f64) -> Result<f64> {
    if delta_t == 0.0 || !delta_t.is_finite() {
        return Err(BatchError::InvalidParameter {
            name: ParamKey::DeltaT.to_string(),
            reason: format!(
                "sampling interval {} gives no defined acquisition rate",
                delta_t
            ),
        });
    }
    Ok(1000.0 / delta_t)
}

/// 导出目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// 结果保存目录
    pub save_folder: PathBuf,
}

impl ExportTarget {
    pub fn new(save_folder: impl Into<PathBuf>) -> Self {
        Self {
            save_folder: save_folder.into(),
        }
    }
}
