use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// 兜底答案：所有启发式都没有命中时提交的固定文本
pub const NO_SOLUTION_SENTINEL: &str = "no-solution-found";

/// 能精确表示为整数的最大浮点数（2^53）
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// 答案值，只有数值和文本两种形态
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Numeric(f64),
    Text(String),
}

impl Answer {
    /// 兜底答案
    pub fn sentinel() -> Self {
        Answer::Text(NO_SOLUTION_SENTINEL.to_string())
    }

    /// 从任意 JSON 值构造答案
    ///
    /// 数字 → 数值；字符串 → 文本；其余形态按紧凑 JSON 文本保存
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => Answer::Numeric(f),
                None => Answer::Text(n.to_string()),
            },
            JsonValue::String(s) => Answer::Text(s.clone()),
            other => Answer::Text(other.to_string()),
        }
    }

    /// 提交前的数值化：完整解析为有限数字的文本转为数值
    ///
    /// 全流程只在提交客户端调用这一次
    pub fn coerced(self) -> Self {
        match self {
            Answer::Text(text) => match text.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Answer::Numeric(f),
                _ => Answer::Text(text),
            },
            numeric => numeric,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Answer::Text(t) if t == NO_SOLUTION_SENTINEL)
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // JSON 没有 NaN / 无穷大，改交兜底文本
            Answer::Numeric(f) if !f.is_finite() => serializer.serialize_str(NO_SOLUTION_SENTINEL),
            // 整数值按整数输出（42 而不是 42.0）
            Answer::Numeric(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => {
                serializer.serialize_i64(*f as i64)
            }
            Answer::Numeric(f) => serializer.serialize_f64(*f),
            Answer::Text(t) => serializer.serialize_str(t),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Numeric(n) => write!(f, "{}", n),
            Answer::Text(t) => write!(f, "\"{}\"", t),
        }
    }
}
