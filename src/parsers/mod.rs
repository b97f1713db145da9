//! # 解析器模块
//!
//! 提供输入表格文件的解析器。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: size_table

pub mod size_table;

pub use size_table::{parse_size_table, read_size_table};
