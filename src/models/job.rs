//! # 批处理条目数据模型
//!
//! - `InventoryEntry`: 扫描得到的单个数据文件及其尺寸、文件夹标签
//! - `JobDescriptor`: 条目与分析参数合并后的完整作业描述
//! - `DefaultParams`: 扫描时快照的默认参数
//!
//! 参数以扁平映射保存（与运行计划 JSON 中的条目对象一一对应），
//! 仅在使用时转换为浮点数；缺失或空值按 0.0 处理。
//!
//! ## 依赖关系
//! - 被 `batch/scanner.rs` 创建 `InventoryEntry`
//! - 被 `batch/executor.rs` 和 `engine/config.rs` 读取

use crate::error::{BatchError, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// 扫描得到的数据文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// 文件名（含扩展名）
    pub file_name: String,
    /// 匹配到的尺寸表标签，未匹配时为直接父目录名
    pub folder_name: String,
    /// 颗粒尺寸，未匹配时为 0.0
    pub size: f64,
    /// 文件完整路径
    pub file_path: PathBuf,
}

/// 作业参数名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    /// 颗粒尺寸
    Size,
    /// 采样间隔 (ms)
    DeltaT,
    /// 最短轨迹帧数
    Filter,
    /// 总帧数
    Frames,
    /// 视野宽度 (px)
    WidthPx,
    /// 视野宽度 (µm)
    WidthUm,
    /// 分析时长 (s)
    AnalysisTime,
    /// 温度 (°C)
    Temperature,
}

impl ParamKey {
    pub const ALL: [ParamKey; 8] = [
        ParamKey::Size,
        ParamKey::DeltaT,
        ParamKey::Filter,
        ParamKey::Frames,
        ParamKey::WidthPx,
        ParamKey::WidthUm,
        ParamKey::AnalysisTime,
        ParamKey::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKey::Size => "size",
            ParamKey::DeltaT => "delta_t",
            ParamKey::Filter => "filter",
            ParamKey::Frames => "frames",
            ParamKey::WidthPx => "width_px",
            ParamKey::WidthUm => "width_um",
            ParamKey::AnalysisTime => "analysis_time",
            ParamKey::Temperature => "temperature",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKey {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ParamKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| BatchError::InvalidParameter {
                name: s.to_string(),
                reason: format!(
                    "unknown parameter, expected one of: {}",
                    ParamKey::ALL.map(|k| k.as_str()).join(", ")
                ),
            })
    }
}

/// 参数原始值
///
/// 运行计划可能由外部编辑，数值可能以字符串形式出现。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl ParamValue {
    /// 转换为浮点数：缺失或空字符串为 0.0，非数值字符串报错
    pub fn to_f64(&self, name: &str) -> Result<f64> {
        match self {
            ParamValue::Number(v) => Ok(*v),
            ParamValue::Missing => Ok(0.0),
            ParamValue::Text(s) if s.trim().is_empty() => Ok(0.0),
            ParamValue::Text(s) => s.trim().parse().map_err(|_| BatchError::InvalidParameter {
                name: name.to_string(),
                reason: format!("could not convert '{}' to float", s),
            }),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

/// 默认分析参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultParams {
    pub delta_t: f64,
    pub filter: f64,
    pub frames: f64,
    pub width_px: f64,
    pub width_um: f64,
    pub analysis_time: f64,
    pub temperature: f64,
}

impl Default for DefaultParams {
    fn default() -> Self {
        DefaultParams {
            delta_t: 33.33,
            filter: 30.0,
            frames: 400.0,
            width_px: 512.0,
            width_um: 318.2,
            analysis_time: 13.33,
            temperature: 25.0,
        }
    }
}

impl DefaultParams {
    /// 以 (参数名, 值) 列出全部默认参数
    pub fn entries(&self) -> [(ParamKey, f64); 7] {
        [
            (ParamKey::DeltaT, self.delta_t),
            (ParamKey::Filter, self.filter),
            (ParamKey::Frames, self.frames),
            (ParamKey::WidthPx, self.width_px),
            (ParamKey::WidthUm, self.width_um),
            (ParamKey::AnalysisTime, self.analysis_time),
            (ParamKey::Temperature, self.temperature),
        ]
    }
}

/// 单个文件的完整作业描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub file_name: String,
    #[serde(default)]
    pub folder_name: String,
    pub file_path: PathBuf,
    /// 扁平参数映射（含 `size`）
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamValue>,
}

impl JobDescriptor {
    /// 合并扫描条目与当前默认参数
    ///
    /// 默认参数在此时被复制，之后修改全局默认值不会影响已创建的条目。
    pub fn from_entry(entry: &InventoryEntry, defaults: &DefaultParams) -> Self {
        let mut params = BTreeMap::new();
        params.insert(ParamKey::Size.as_str().to_string(), entry.size.into());
        for (key, value) in defaults.entries() {
            params.insert(key.as_str().to_string(), value.into());
        }

        JobDescriptor {
            file_name: entry.file_name.clone(),
            folder_name: entry.folder_name.clone(),
            file_path: entry.file_path.clone(),
            params,
        }
    }

    /// 读取参数浮点值，缺失时为 0.0
    pub fn param(&self, key: ParamKey) -> Result<f64> {
        match self.params.get(key.as_str()) {
            Some(value) => value.to_f64(key.as_str()),
            None => Ok(0.0),
        }
    }

    /// 覆盖单个参数
    pub fn set_param(&mut self, key: ParamKey, value: f64) {
        self.params.insert(key.as_str().to_string(), value.into());
    }

    /// 从 `key=value` 形式的字符串覆盖参数
    pub fn apply_override(&mut self, assignment: &str) -> Result<()> {
        let (name, raw) = assignment.split_once('=').ok_or_else(|| {
            BatchError::InvalidArgument(format!(
                "Expected key=value, got '{}'",
                assignment
            ))
        })?;

        let key: ParamKey = name.parse()?;
        let value: f64 = raw.trim().parse().map_err(|_| BatchError::InvalidParameter {
            name: key.to_string(),
            reason: format!("could not convert '{}' to float", raw.trim()),
        })?;

        self.set_param(key, value);
        Ok(())
    }
}
