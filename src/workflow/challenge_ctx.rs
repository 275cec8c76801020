//! 会话上下文
//!
//! 封装"这是哪个会话、已经跳了几次"这一信息

use std::fmt::Display;

/// 单个会话允许的最大跳转次数
pub const MAX_HOPS: u32 = 5;

/// 跳转计数
///
/// 只由流程层持有和修改
#[derive(Debug, Clone)]
pub struct LoopSession {
    /// 会话编号（仅用于日志显示）
    pub session_id: String,

    /// 已经跟随的跳转次数
    pub hop_count: u32,

    pub max_hops: u32,
}

impl LoopSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            hop_count: 0,
            max_hops: MAX_HOPS,
        }
    }

    /// 还能跳转时计数加一并返回 true；已到上限返回 false
    pub fn advance(&mut self) -> bool {
        if self.hop_count < self.max_hops {
            self.hop_count += 1;
            true
        } else {
            false
        }
    }
}

impl Display for LoopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 {} 跳转 {}/{}]", self.session_id, self.hop_count, self.max_hops)
    }
}
