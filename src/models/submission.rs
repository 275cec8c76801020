use crate::models::answer::Answer;
use crate::models::task::Identity;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// 提交载荷
///
/// 构造后不可修改；发送前只允许做一次答案数值化（见 [`SubmissionPayload::for_wire`]）
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionPayload {
    email: String,
    secret: String,
    url: String,
    answer: Answer,
}

impl SubmissionPayload {
    pub fn new(identity: &Identity, source_url: impl Into<String>, answer: Answer) -> Self {
        Self {
            email: identity.email.clone(),
            secret: identity.secret.clone(),
            url: source_url.into(),
            answer,
        }
    }

    pub fn answer(&self) -> &Answer {
        &self.answer
    }

    pub fn source_url(&self) -> &str {
        &self.url
    }

    /// 生成实际发送的载荷：数字文本转换为数值，其余字段不变
    pub fn for_wire(&self) -> Self {
        Self {
            answer: self.answer.clone().coerced(),
            ..self.clone()
        }
    }
}

/// 提交结果
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    /// 原始响应体
    pub raw_body: String,
    /// 响应中顶层的 `url` 字段：下一题地址
    pub next_url: Option<String>,
    /// 判题结果（若有）
    pub correct: Option<bool>,
    /// 判题说明（若有）
    pub reason: Option<String>,
}

impl SubmissionResult {
    /// 解析响应体；非 JSON 响应视为没有下一题
    pub fn from_body(raw_body: String) -> Self {
        let json: Option<JsonValue> = serde_json::from_str(&raw_body).ok();
        let field = |name: &str| json.as_ref().and_then(|v| v.get(name)).cloned();

        let next_url = field("url")
            .and_then(|v| v.as_str().map(str::trim).map(str::to_string))
            .filter(|u| !u.is_empty());
        let correct = field("correct").and_then(|v| v.as_bool());
        let reason = field("reason").and_then(|v| v.as_str().map(str::to_string));

        Self {
            raw_body,
            next_url,
            correct,
            reason,
        }
    }
}
