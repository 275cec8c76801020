use serde::{Deserialize, Serialize};

/// 一次跳转抓取到的挑战页面
///
/// 由页面抓取器每跳生成一次，解析器和各策略只读使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeTask {
    /// 页面地址，也是相对提交地址的解析基准
    pub source_url: String,
    /// 脚本执行后的 HTML
    pub html: String,
    /// 页面可见文本（innerText）
    pub rendered_text: String,
}

impl ChallengeTask {
    pub fn new(
        source_url: impl Into<String>,
        html: impl Into<String>,
        rendered_text: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            html: html.into(),
            rendered_text: rendered_text.into(),
        }
    }
}

/// 触发请求中的身份信息，随每次提交原样发送
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub secret: String,
}
