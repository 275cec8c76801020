//! 挑战循环 - 流程层
//!
//! 核心职责：定义"一个会话"的完整处理流程
//!
//! 流程顺序：
//! 1. 解析提交地址（失败即结束）
//! 2. 提取答案（一定有结果）
//! 3. 提交（无结果即结束）
//! 4. 响应中有下一题地址且未到跳转上限 → 抓取新页面，回到 1

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::PageFetcher;
use crate::models::{ChallengeTask, Identity, SubmissionPayload};
use crate::services::{AnswerSubmitter, EndpointResolver, ExtractionChain};
use crate::utils::truncate_text;
use crate::workflow::challenge_ctx::LoopSession;

/// 会话结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 响应中没有下一题地址
    Completed { hops: u32 },
    /// 跳转次数用尽时响应中仍有下一题地址
    LimitReached { hops: u32 },
}

/// 挑战循环
///
/// - 编排解析、提取、提交、跳转
/// - 不持有浏览器资源（页面抓取器由调用方传入）
/// - 每一跳都重新解析和提取，不跨跳缓存
pub struct ChallengeFlow {
    resolver: EndpointResolver,
    chain: ExtractionChain,
    submitter: Arc<dyn AnswerSubmitter>,
}

impl ChallengeFlow {
    pub fn new(chain: ExtractionChain, submitter: Arc<dyn AnswerSubmitter>) -> Self {
        Self {
            resolver: EndpointResolver::new(),
            chain,
            submitter,
        }
    }

    pub async fn run(
        &self,
        pages: &dyn PageFetcher,
        mut session: LoopSession,
        first_url: &str,
        identity: &Identity,
    ) -> AppResult<SessionOutcome> {
        info!("{} 🌐 打开首个页面: {}", session, first_url);
        let mut task = pages.fetch_rendered_page(first_url).await?;

        loop {
            let next_url = self.solve_once(&task, &session, identity).await?;

            let Some(next_url) = next_url else {
                info!("{} ✅ 响应中没有下一题地址，会话完成", session);
                return Ok(SessionOutcome::Completed {
                    hops: session.hop_count,
                });
            };

            if !session.advance() {
                warn!(
                    "{} ⏹️ 已达跳转上限，不再跟随: {}",
                    session, next_url
                );
                return Ok(SessionOutcome::LimitReached {
                    hops: session.hop_count,
                });
            }

            info!("{} ➡️ 跳转到下一题: {}", session, next_url);
            task = pages.fetch_rendered_page(&next_url).await?;
        }
    }

    /// 处理当前页面一次：解析 → 提取 → 提交，返回下一题地址
    async fn solve_once(
        &self,
        task: &ChallengeTask,
        session: &LoopSession,
        identity: &Identity,
    ) -> AppResult<Option<String>> {
        info!(
            "{} 📄 页面文本: {}",
            session,
            truncate_text(&task.rendered_text, 120)
        );

        let endpoint = self.resolver.resolve(task)?;
        info!("{} 🎯 提交地址: {}", session, endpoint);

        let extraction = self.chain.extract(task).await;
        info!(
            "{} 🧮 答案 [{}]: {}",
            session, extraction.strategy, extraction.answer
        );

        let payload = SubmissionPayload::new(identity, task.source_url.clone(), extraction.answer);
        let result = self
            .submitter
            .submit(&endpoint, &payload)
            .await
            .ok_or_else(|| AppError::Submit {
                endpoint: endpoint.clone(),
            })?;

        if let Some(correct) = result.correct {
            info!(
                "{} 判题结果: correct={} reason={}",
                session,
                correct,
                result.reason.as_deref().unwrap_or("-")
            );
        }
        Ok(result.next_url)
    }
}
