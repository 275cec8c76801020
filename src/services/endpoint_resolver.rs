//! 提交地址解析 - 业务能力层
//!
//! 只负责"从页面中找到提交地址"能力

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::ChallengeTask;

/// ① 元素属性中包含 submit 的值
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:action|href|data-[\w-]+)\s*=\s*["']([^"']*submit[^"']*)["']"#)
        .expect("attribute regex")
});

/// ② 以 /submit 路径段结尾的绝对地址，允许被行内标签切开
static ABSOLUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:https?:)?//(?:[^\s"'<>]|<[^>]*>)*?/submit\b"#).expect("absolute regex")
});

/// ③ 引号中的相对路径：`/`、`./`、`../` 开头，或 `api/submit` 这种至少带一个 `/` 的裸路径
static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)["']((?:\.{0,2}/[^"'\s<>]*|[\w.~%-]+(?:/[\w.~%-]+)*/[^"'\s<>]*)submit[^"'\s<>]*)["']"#,
    )
    .expect("relative regex")
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

const ZERO_WIDTH: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// 提交地址解析服务
///
/// 按固定顺序尝试三种模式，第一个命中的模式决定结果，后面的模式不再参与
#[derive(Debug, Default, Clone, Copy)]
pub struct EndpointResolver;

impl EndpointResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析任务页面的提交地址
    pub fn resolve(&self, task: &ChallengeTask) -> AppResult<String> {
        let raw = find_candidate(&task.html)
            .ok_or_else(|| AppError::resolution("页面中没有包含 submit 的地址"))?;
        debug!("提交地址候选: {}", raw);
        normalize_submit_url(&raw, &task.source_url)
    }
}

fn find_candidate(html: &str) -> Option<String> {
    let attribute = ATTRIBUTE_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|v| is_plausible(v));
    if let Some(value) = attribute {
        return Some(value.to_string());
    }

    if let Some(m) = ABSOLUTE_RE.find(html) {
        return Some(m.as_str().to_string());
    }

    RELATIVE_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|v| is_plausible(v))
        .map(str::to_string)
}

/// 排除脚本伪链接和页内锚点
fn is_plausible(value: &str) -> bool {
    let v = value.trim_start().to_ascii_lowercase();
    !(v.starts_with("javascript:") || v.starts_with('#') || v.starts_with("mailto:"))
}

/// 清洗并规范化提交地址
///
/// - 去掉标签、零宽字符和首尾空白
/// - `//host/...` 补 `https:`
/// - 已是 http/https 绝对地址的原样保留
/// - 其余按页面地址解析为绝对地址
pub fn normalize_submit_url(raw: &str, base_url: &str) -> AppResult<String> {
    let without_tags = TAG_RE.replace_all(raw, "");
    let cleaned: String = without_tags
        .replace("&amp;", "&")
        .chars()
        .filter(|c| !ZERO_WIDTH.contains(c))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(AppError::resolution("提交地址清洗后为空"));
    }

    let lower = cleaned.to_ascii_lowercase();
    let resolved = if cleaned.starts_with("//") {
        format!("https:{}", cleaned)
    } else if lower.starts_with("http://") || lower.starts_with("https://") {
        cleaned.to_string()
    } else {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::resolution(format!("页面地址无效 {}: {}", base_url, e)))?;
        base.join(cleaned)
            .map_err(|e| AppError::resolution(format!("无法拼接 {}: {}", cleaned, e)))?
            .to_string()
    };

    let parsed = Url::parse(&resolved)
        .map_err(|e| AppError::resolution(format!("提交地址无效 {}: {}", resolved, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::resolution(format!(
            "提交地址不是 http/https 绝对地址: {}",
            resolved
        )));
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://quiz.example.com/demo/page1";

    fn resolve(html: &str) -> AppResult<String> {
        EndpointResolver::new().resolve(&ChallengeTask::new(BASE, html, ""))
    }

    #[test]
    fn test_normalize_absolute_is_idempotent() {
        let once = normalize_submit_url("  <b>https://judge.io/submit</b>\u{200B} ", BASE).unwrap();
        assert_eq!(once, "https://judge.io/submit");
        let twice = normalize_submit_url(&once, BASE).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_relative_path_uses_page_url() {
        assert_eq!(
            resolve(r#"<form action="/submit/abc" method="post"></form>"#).unwrap(),
            "https://quiz.example.com/submit/abc"
        );
        assert_eq!(
            normalize_submit_url("/submit/abc", BASE).unwrap(),
            "https://quiz.example.com/submit/abc"
        );
    }

    #[test]
    fn test_protocol_relative() {
        assert_eq!(
            normalize_submit_url("//judge.io/submit", BASE).unwrap(),
            "https://judge.io/submit"
        );
    }

    #[test]
    fn test_absolute_url_stops_at_submit_segment() {
        let html = r#"<pre>POST to https://judge.io/submit%7B%22email%22%7D</pre>"#;
        assert_eq!(resolve(html).unwrap(), "https://judge.io/submit");
    }

    #[test]
    fn test_absolute_url_split_by_markup() {
        let html = r#"<p>Post your answer to <span class="origin">https://judge.io</span>/submit</p>"#;
        assert_eq!(resolve(html).unwrap(), "https://judge.io/submit");
    }

    #[test]
    fn test_attribute_wins_over_text() {
        let html = r#"
            <p>Old endpoint: https://old.io/submit</p>
            <form action="https://new.io/api/submit"></form>
        "#;
        assert_eq!(resolve(html).unwrap(), "https://new.io/api/submit");
    }

    #[test]
    fn test_quoted_relative_path_in_script() {
        let html = r#"<script>fetch('./submit?id=7', {method: 'POST'})</script>"#;
        assert_eq!(
            resolve(html).unwrap(),
            "https://quiz.example.com/demo/submit?id=7"
        );
    }

    #[test]
    fn test_bare_relative_path_in_script() {
        let html = r#"<script>fetch("api/submit", {method: "POST", body: data})</script>"#;
        assert_eq!(
            resolve(html).unwrap(),
            "https://quiz.example.com/demo/api/submit"
        );
    }

    #[test]
    fn test_ignores_button_type_and_script_links() {
        let html = r#"<button type="submit">Go</button><a href="javascript:submit()">x</a>"#;
        assert!(matches!(resolve(html), Err(AppError::Resolution { .. })));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        let html = r#"<form action="ftp://files.io/submit"></form>"#;
        assert!(matches!(resolve(html), Err(AppError::Resolution { .. })));
    }
}
