//! # 尺寸表解析器
//!
//! 解析记录颗粒尺寸的表格文件，支持 CSV 与 Excel 工作簿。
//!
//! ## 格式说明
//! ```text
//! label,size          <- 第 1 行为表头，跳过
//! PS100,100
//! PS200 , 200.5       <- 标签去除空白
//! ,                   <- 标签为空的行跳过
//! ```
//! 第 1 列为标签，第 2 列为数值尺寸，其余列忽略。
//! 尺寸无法解析为数值时整个解析失败。
//!
//! 工作簿（`.xlsx`/`.xlsm`/`.xls`/`.xlsb`/`.ods`）只读取第一个工作表，
//! 第 1 行同样视为表头，A 列为标签，B 列为尺寸。
//!
//! ## 依赖关系
//! - 被 `commands/scan.rs` 使用
//! - 使用 `models/size_table.rs`
//! - 使用 `csv`、`calamine` crate

use crate::error::{BatchError, Result};
use crate::models::SizeTable;

use calamine::{open_workbook, Data, Ods, Range, Reader, Sheets, Xls, Xlsb, Xlsx};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// 按工作簿读取的扩展名
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// 读取尺寸表文件，按扩展名选择 CSV 或工作簿解析
pub fn read_size_table(path: &Path) -> Result<SizeTable> {
    if is_workbook(path) {
        return read_size_workbook(path);
    }

    let file = File::open(path).map_err(|e| BatchError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_size_table(file, &path.display().to_string())
}

/// 小写扩展名
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn is_workbook(path: &Path) -> bool {
    WORKBOOK_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// 从任意读取源解析 CSV 尺寸表
pub fn parse_size_table<R: Read>(reader: R, source_name: &str) -> Result<SizeTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut table = SizeTable::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let label = record.get(0).unwrap_or("");
        let raw_size = record.get(1).unwrap_or("");
        insert_row(&mut table, source_name, line, label, raw_size)?;
    }

    Ok(table)
}

/// 读取工作簿的第一个工作表
pub fn read_size_workbook(path: &Path) -> Result<SizeTable> {
    let source_name = path.display().to_string();
    fs::metadata(path).map_err(|e| BatchError::FileReadError {
        path: source_name.clone(),
        source: e,
    })?;

    let workbook_error = |reason: String| BatchError::ParseError {
        format: "size workbook".to_string(),
        path: source_name.clone(),
        reason,
    };

    let opened: std::result::Result<Sheets<_>, String> = match extension_of(path).as_str() {
        "xls" => open_workbook::<Xls<_>, _>(path)
            .map(Sheets::Xls)
            .map_err(|e| e.to_string()),
        "xlsb" => open_workbook::<Xlsb<_>, _>(path)
            .map(Sheets::Xlsb)
            .map_err(|e| e.to_string()),
        "ods" => open_workbook::<Ods<_>, _>(path)
            .map(Sheets::Ods)
            .map_err(|e| e.to_string()),
        _ => open_workbook::<Xlsx<_>, _>(path)
            .map(Sheets::Xlsx)
            .map_err(|e| e.to_string()),
    };
    let mut workbook = opened.map_err(workbook_error)?;
    let sheet = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("workbook has no sheets".to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    parse_size_sheet(&sheet, &source_name)
}

/// 解析工作表：跳过第 1 行，A 列标签、B 列尺寸
pub fn parse_size_sheet(sheet: &Range<Data>, source_name: &str) -> Result<SizeTable> {
    let mut table = SizeTable::new();

    let (Some((first_row, _)), Some((last_row, _))) = (sheet.start(), sheet.end()) else {
        return Ok(table);
    };

    for row in first_row.max(1)..=last_row {
        let label = cell_text(sheet.get_value((row, 0)));
        let raw_size = cell_text(sheet.get_value((row, 1)));
        insert_row(&mut table, source_name, row as u64 + 1, &label, &raw_size)?;
    }

    Ok(table)
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(v)) => v.to_string(),
        Some(Data::Int(v)) => v.to_string(),
        Some(other) => other.to_string(),
    }
}

/// 校验并登记一行；空标签跳过，尺寸非数值时报错
fn insert_row(
    table: &mut SizeTable,
    source_name: &str,
    line: u64,
    label: &str,
    raw_size: &str,
) -> Result<()> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(());
    }

    let raw_size = raw_size.trim();
    let size: f64 = raw_size.parse().map_err(|_| BatchError::ParseError {
        format: "size table".to_string(),
        path: source_name.to_string(),
        reason: format!(
            "line {}: size '{}' for label '{}' is not a number",
            line, raw_size, label
        ),
    })?;

    table.insert(label, size);
    Ok(())
}
