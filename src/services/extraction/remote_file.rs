use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{AppError, AppResult};
use crate::infrastructure::ResourceFetcher;
use crate::models::resource::extension_of;
use crate::models::{Answer, ChallengeTask, FileKind};
use crate::services::extraction::tabular::{coerce_number, parse_delimited, parse_workbook, TableData};
use crate::services::extraction::ExtractionStrategy;

/// 音频附件不做内容分析，固定回答 0
const AUDIO_SENTINEL: f64 = 0.0;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector"));

/// 数字片段：整数、千分位、小数、科学计数
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:[eE][-+]?\d+)?|[-+]?\.\d+")
        .expect("number regex")
});

/// 附件策略
///
/// 职责：
/// - 按文档顺序找出附件链接
/// - 逐个下载（不并发），按嗅探出的真实类型分别处理
/// - 单个附件失败只跳过该附件
pub struct RemoteFile {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl RemoteFile {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }

    async fn process_link(&self, link: &str) -> AppResult<Option<Answer>> {
        let resource = self.fetcher.fetch_bytes(link).await?;
        debug!("附件 {} 嗅探类型 {:?}", resource.url, resource.kind);

        match resource.kind {
            Some(FileKind::Pdf) => {
                let text = extract_pdf_text(resource.bytes).await?;
                Ok(sum_value_lines(&text).map(Answer::Numeric))
            }
            Some(FileKind::Tabular) => {
                let ext = extension_of(link);
                let data = parse_delimited(&resource.bytes, ext.as_deref())?;
                Ok(summed(link, &data))
            }
            Some(FileKind::Workbook) => {
                let data = parse_workbook(&resource.bytes)?;
                Ok(summed(link, &data))
            }
            Some(FileKind::Audio) => {
                info!("🎧 音频附件不做分析，使用固定答案: {}", link);
                Ok(Some(Answer::Numeric(AUDIO_SENTINEL)))
            }
            None => {
                debug!("无法识别附件类型: {}", link);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl ExtractionStrategy for RemoteFile {
    fn name(&self) -> &'static str {
        "remote-file"
    }

    async fn try_extract(&self, task: &ChallengeTask) -> Option<Answer> {
        let links = candidate_links(&task.html, &task.source_url);
        if links.is_empty() {
            return None;
        }
        info!("📎 发现 {} 个附件链接: {:?}", links.len(), links);

        for link in &links {
            match self.process_link(link).await {
                Ok(Some(answer)) => return Some(answer),
                Ok(None) => debug!("附件未得出答案: {}", link),
                Err(e) => warn!("❗ 附件处理失败 {}: {}", link, e),
            }
        }
        None
    }
}

fn summed(link: &str, data: &TableData) -> Option<Answer> {
    let (column, sum) = data.sum_matched_column()?;
    debug!("附件 {} 选中列 '{}'，求和 {}", link, column, sum);
    Some(Answer::Numeric(sum))
}

/// 按文档顺序列出附件链接（绝对地址，去重）
///
/// 扩展名是支持的类型，或 `<a>` 带 `download` 属性
pub fn candidate_links(html: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(absolute.scheme(), "http" | "https") {
            continue;
        }
        let absolute = absolute.to_string();
        let is_file = FileKind::from_extension(&absolute).is_some()
            || anchor.value().attr("download").is_some();
        if is_file && seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }
    links
}

/// 在阻塞线程中提取 PDF 文本；解析库崩溃也只算解析失败
async fn extract_pdf_text(bytes: Vec<u8>) -> AppResult<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::parse("pdf", e))?
        .map_err(|e| AppError::parse("pdf", format!("{:?}", e)))
}

/// 对含 "value" 的行中出现的所有数字求和；一个数字都没有时返回 None
pub fn sum_value_lines(text: &str) -> Option<f64> {
    let numbers: Vec<f64> = text
        .lines()
        .filter(|line| line.to_lowercase().contains("value"))
        .flat_map(|line| NUMBER_RE.find_iter(line))
        .filter_map(|m| coerce_number(m.as_str()))
        .collect();

    if numbers.is_empty() {
        None
    } else {
        Some(numbers.iter().sum())
    }
}
