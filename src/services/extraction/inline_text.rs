use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Answer, ChallengeTask};
use crate::services::extraction::tabular::coerce_number;
use crate::services::extraction::ExtractionStrategy;

/// `answer` 后面紧跟（可隔空白、冒号、等号）的数字
static INLINE_ANSWER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)answer[\s:=]*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)")
        .expect("inline answer regex")
});

/// 可见文本中的 `Answer: 123`
#[derive(Debug, Default)]
pub struct InlineText;

impl InlineText {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExtractionStrategy for InlineText {
    fn name(&self) -> &'static str {
        "inline-text"
    }

    async fn try_extract(&self, task: &ChallengeTask) -> Option<Answer> {
        INLINE_ANSWER_RE
            .captures_iter(&task.rendered_text)
            .filter_map(|c| c.get(1))
            .find_map(|m| coerce_number(m.as_str()))
            .map(Answer::Numeric)
    }
}
