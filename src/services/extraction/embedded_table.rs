use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{Answer, ChallengeTask};
use crate::services::extraction::tabular::TableData;
use crate::services::extraction::ExtractionStrategy;

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("cell selector"));
static DATA_CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("td selector"));
static HEAD_ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("thead tr").expect("thead selector"));

/// 页面内表格策略
///
/// 只有可见文本同时提到 "sum" 和 "value" 时才尝试
#[derive(Debug, Default)]
pub struct EmbeddedTable;

impl EmbeddedTable {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtractionStrategy for EmbeddedTable {
    fn name(&self) -> &'static str {
        "embedded-table"
    }

    async fn try_extract(&self, task: &ChallengeTask) -> Option<Answer> {
        let text = task.rendered_text.to_lowercase();
        if !(text.contains("sum") && text.contains("value")) {
            return None;
        }

        let tables = parse_html_tables(&task.html);
        debug!("页面中共有 {} 个表格", tables.len());

        tables.iter().find_map(|table| {
            let (column, sum) = table.sum_matched_column()?;
            debug!("表格列 '{}' 求和 {}", column, sum);
            Some(Answer::Numeric(sum))
        })
    }
}

/// 把页面中的 `<table>` 转成 [`TableData`]，按文档顺序
///
/// 每行的单元格都按 `th, td` 的文档顺序读取，行首的 `<th>` 标签列不会错位。
/// 表头取 `<thead>` 的第一行；没有 `<thead>` 时取第一个非空行。
/// `<tfoot>` 中的行和只有 `<th>` 的行不算数据行
pub fn parse_html_tables(html: &str) -> Vec<TableData> {
    let document = Html::parse_document(html);
    document.select(&TABLE_SELECTOR).map(table_data).collect()
}

fn table_data(table: ElementRef<'_>) -> TableData {
    let rows: Vec<ElementRef<'_>> = table
        .select(&ROW_SELECTOR)
        .filter(|row| row.select(&CELL_SELECTOR).next().is_some())
        .collect();

    let header_row = table
        .select(&HEAD_ROW_SELECTOR)
        .next()
        .or_else(|| rows.first().copied());
    let headers = header_row.map(cells).unwrap_or_default();

    let data = rows
        .iter()
        .filter(|row| Some(row.id()) != header_row.map(|h| h.id()))
        .filter(|row| !in_footer(row))
        .filter(|row| row.select(&DATA_CELL_SELECTOR).next().is_some())
        .map(|row| cells(*row))
        .collect();

    TableData::new(headers, data)
}

fn in_footer(row: &ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "tfoot")
}

fn cells(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}
