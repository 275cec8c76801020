//! 表格数据的公共规则
//!
//! CSV、工作簿和页面内 `<table>` 都先转成 [`TableData`]，再走同一套选列和求和规则

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};

/// 按优先级排列的候选列名片段
pub const COLUMN_CANDIDATES: [&str; 5] = ["value", "amount", "total", "price", "frequency"];

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$").expect("numeric regex")
});

/// 表头 + 数据行
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// 选出要求和的列
    ///
    /// 候选片段按优先级依次检查；命中的片段下取最左边的列。没有数据行时不选列
    pub fn pick_column(&self) -> Option<usize> {
        if self.rows.is_empty() {
            return None;
        }
        let lowered: Vec<String> = self.headers.iter().map(|h| h.to_lowercase()).collect();
        COLUMN_CANDIDATES
            .iter()
            .find_map(|candidate| lowered.iter().position(|h| h.contains(candidate)))
    }

    /// 对选中的列求和，返回 (列名, 和)
    ///
    /// 列一旦选中，无法解析的单元格按 0 计
    pub fn sum_matched_column(&self) -> Option<(String, f64)> {
        let column = self.pick_column()?;
        let sum = self
            .rows
            .iter()
            .map(|row| row.get(column).and_then(|cell| coerce_number(cell)).unwrap_or(0.0))
            .sum();
        Some((self.headers[column].clone(), sum))
    }
}

/// 把单元格文本转成数字：去掉千分位逗号和首尾空白后必须是带符号的小数或科学计数
pub fn coerce_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if !NUMERIC_RE.is_match(&cleaned) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// 解析 CSV / TSV 文本
///
/// 分隔符按扩展名提示或首行内容判断
pub fn parse_delimited(bytes: &[u8], extension: Option<&str>) -> AppResult<TableData> {
    let delimiter = match extension {
        Some("tsv") => b'\t',
        _ => detect_delimiter(bytes),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .delimiter(delimiter)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::parse("csv", e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::parse("csv", e))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(TableData::new(headers, rows))
}

fn detect_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |d: u8| first_line.iter().filter(|b| **b == d).count();
    [b',', b'\t', b';']
        .into_iter()
        .max_by_key(|d| count(*d))
        .filter(|d| count(*d) > 0)
        .unwrap_or(b',')
}

/// 解析工作簿的第一个工作表，首行作为表头
pub fn parse_workbook(bytes: &[u8]) -> AppResult<TableData> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::parse("workbook", e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::parse("workbook", "工作簿中没有工作表"))?
        .map_err(|e| AppError::parse("workbook", e))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = rows.next().unwrap_or_default();
    let rows = rows
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok(TableData::new(headers, rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::String(s) => s.trim().to_string(),
        Data::Bool(b) => b.to_string(),
        // 日期、错误值等不参与求和
        _ => String::new(),
    }
}
