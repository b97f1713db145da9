//! # 数据模型模块
//!
//! 定义尺寸表、扫描条目、作业描述和运行计划。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`batch/` 和 `commands/` 使用
//! - 子模块: size_table, job, plan

pub mod job;
pub mod plan;
pub mod size_table;

pub use job::{DefaultParams, InventoryEntry, JobDescriptor, ParamKey, ParamValue};
pub use plan::RunRequest;
pub use size_table::SizeTable;
