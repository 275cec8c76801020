use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::{Answer, ChallengeTask};
use crate::services::extraction::ExtractionStrategy;

/// `atob("...")` / `atob('...')` / atob(`...`)
static ATOB_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"atob\(\s*(?:"([^"]*)"|'([^']*)'|`([^`]*)`)\s*\)"#).expect("atob regex")
});

/// 填充可有可无的标准 base64
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 编码载荷策略
///
/// 页面脚本里 `atob` 解码的内容若包含带 `answer` 字段的 JSON，直接使用该值
#[derive(Debug, Default)]
pub struct EncodedPayload;

impl EncodedPayload {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtractionStrategy for EncodedPayload {
    fn name(&self) -> &'static str {
        "encoded-payload"
    }

    async fn try_extract(&self, task: &ChallengeTask) -> Option<Answer> {
        for blob in encoded_blobs(&task.html) {
            match answer_from_blob(blob) {
                Ok(Some(answer)) => return Some(answer),
                Ok(None) => debug!("编码载荷中没有 answer 字段"),
                Err(e) => warn!("编码载荷解析失败: {}", e),
            }
        }
        None
    }
}

/// 按出现顺序列出所有 atob 参数
fn encoded_blobs(html: &str) -> Vec<&str> {
    ATOB_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str())
        .collect()
}

/// 解码并读取 `answer` 字段
///
/// 没有 JSON 对象或对象中没有 `answer` 时返回 `Ok(None)`
fn answer_from_blob(blob: &str) -> AppResult<Option<Answer>> {
    let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = LENIENT_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| AppError::parse("base64", e))?;
    let decoded = String::from_utf8_lossy(&bytes);
    debug!("解码载荷长度: {}", decoded.len());

    let Some(object) = first_balanced_object(&decoded) else {
        return Ok(None);
    };
    let record: JsonValue = serde_json::from_str(object)?;
    Ok(record.get("answer").map(Answer::from_json))
}

/// 找到第一个括号配平的 `{...}` 片段，字符串字面量中的括号不计
pub fn first_balanced_object(text: &str) -> Option<&str> {
    text.match_indices('{')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn page_with(script: &str) -> ChallengeTask {
        ChallengeTask::new("https://q.io/1", format!("<script>{}</script>", script), "")
    }

    #[test]
    fn test_first_balanced_object() {
        let text = r#"payload: {"a": {"b": "}"}, "answer": 1} trailing } {"x": 2}"#;
        assert_eq!(
            first_balanced_object(text),
            Some(r#"{"a": {"b": "}"}, "answer": 1}"#)
        );
        assert_eq!(first_balanced_object("no braces"), None);
        assert_eq!(first_balanced_object("{ never closed"), None);
    }

    #[tokio::test]
    async fn test_decodes_answer_inside_markup() {
        let decoded = r#"<p>Post JSON like <pre>{"email": "x", "answer": "abc"}</pre></p>"#;
        let script = format!("el.innerHTML = atob(`{}`);", STANDARD.encode(decoded));
        let answer = EncodedPayload::new().try_extract(&page_with(&script)).await;
        assert_eq!(answer, Some(Answer::Text("abc".into())));
    }

    #[tokio::test]
    async fn test_unpadded_blob() {
        let encoded = STANDARD.encode(r#"{"answer": 42}"#);
        let script = format!("atob('{}')", encoded.trim_end_matches('='));
        let answer = EncodedPayload::new().try_extract(&page_with(&script)).await;
        assert_eq!(answer, Some(Answer::Numeric(42.0)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let bad_json = STANDARD.encode(r#"{"answer": oops}"#);
        let script = format!(r#"atob("%%%not-base64%%%"); atob("{}");"#, bad_json);
        let answer = EncodedPayload::new().try_extract(&page_with(&script)).await;
        assert_eq!(answer, None);
    }

    #[tokio::test]
    async fn test_later_blob_used_when_first_has_no_answer() {
        let first = STANDARD.encode(r#"{"question": "sum it"}"#);
        let second = STANDARD.encode(r#"{"answer": 7.5}"#);
        let script = format!(r#"atob("{}"); atob("{}");"#, first, second);
        let answer = EncodedPayload::new().try_extract(&page_with(&script)).await;
        assert_eq!(answer, Some(Answer::Numeric(7.5)));
    }
}
