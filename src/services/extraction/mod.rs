//! 答案提取 - 业务能力层
//!
//! ## 策略顺序
//!
//! 顺序本身就是契约，第一个命中的策略决定答案，后面的策略不会被调用：
//!
//! 1. [`EncodedPayload`] - `atob("...")` 中解码出的 `{"answer": ...}`
//! 2. [`RemoteFile`] - 页面链接的 CSV / 工作簿 / PDF / 音频附件
//! 3. [`EmbeddedTable`] - 页面内 `<table>`（文本同时提到 sum 和 value 时才尝试）
//! 4. [`InlineText`] - 可见文本中的 `Answer: 123`
//! 5. [`Fallback`] - 兜底文本，永远成功

pub mod embedded_table;
pub mod encoded_payload;
pub mod fallback;
pub mod inline_text;
pub mod remote_file;
pub mod tabular;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::infrastructure::ResourceFetcher;
use crate::models::{Answer, ChallengeTask};

pub use embedded_table::EmbeddedTable;
pub use encoded_payload::EncodedPayload;
pub use fallback::Fallback;
pub use inline_text::InlineText;
pub use remote_file::RemoteFile;
pub use tabular::{coerce_number, TableData, COLUMN_CANDIDATES};

/// 单个提取策略
///
/// 策略内部的错误（下载失败、解析失败）都就地吸收，对外只表现为 `None`
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// 策略名称（用于日志）
    fn name(&self) -> &'static str;

    /// 尝试从任务中得出答案
    async fn try_extract(&self, task: &ChallengeTask) -> Option<Answer>;
}

/// 提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub answer: Answer,
    /// 给出答案的策略
    pub strategy: &'static str,
}

/// 有序策略链
///
/// 链尾固定接 [`Fallback`]，因此 [`ExtractionChain::extract`] 总能给出答案
pub struct ExtractionChain {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Fallback,
}

impl ExtractionChain {
    /// 标准四策略链
    pub fn standard(resource_fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self::with_strategies(vec![
            Box::new(EncodedPayload::new()),
            Box::new(RemoteFile::new(resource_fetcher)),
            Box::new(EmbeddedTable::new()),
            Box::new(InlineText::new()),
        ])
    }

    /// 自定义策略链（兜底策略仍会自动接在最后）
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self {
            strategies,
            fallback: Fallback::new(),
        }
    }

    /// 策略名称，按尝试顺序
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(Fallback::NAME))
            .collect()
    }

    /// 依次尝试各策略，返回第一个命中的答案
    pub async fn extract(&self, task: &ChallengeTask) -> Extraction {
        for strategy in &self.strategies {
            match strategy.try_extract(task).await {
                Some(answer) => {
                    info!("🧩 策略 [{}] 得出答案: {}", strategy.name(), answer);
                    return Extraction {
                        answer,
                        strategy: strategy.name(),
                    };
                }
                None => debug!("策略 [{}] 未命中", strategy.name()),
            }
        }

        let answer = self.fallback.answer();
        info!("🧩 所有启发式均未命中，使用兜底答案: {}", answer);
        Extraction {
            answer,
            strategy: Fallback::NAME,
        }
    }
}
