//! 答案提交 - 业务能力层
//!
//! 只负责"把载荷 POST 到提交地址并读回响应"能力

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{SubmissionPayload, SubmissionResult};

/// 单次提交的超时
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// 提交能力
///
/// 失败（网络、超时、非 2xx）一律表现为 `None`，由流程层决定如何终止
#[async_trait]
pub trait AnswerSubmitter: Send + Sync {
    async fn submit(&self, endpoint: &str, payload: &SubmissionPayload) -> Option<SubmissionResult>;
}

/// 基于 reqwest 的提交客户端
#[derive(Clone)]
pub struct SubmissionClient {
    client: reqwest::Client,
}

impl SubmissionClient {
    pub fn new() -> AppResult<Self> {
        Self::with_timeout(SUBMIT_TIMEOUT)
    }

    fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn post(&self, endpoint: &str, payload: &SubmissionPayload) -> AppResult<SubmissionResult> {
        let wire = payload.for_wire();
        debug!("提交载荷: {}", serde_json::to_string(&wire)?);

        let response = self
            .client
            .post(endpoint)
            .json(&wire)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::transport(endpoint, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport(endpoint, e))?;
        Ok(SubmissionResult::from_body(body))
    }
}

#[async_trait]
impl AnswerSubmitter for SubmissionClient {
    async fn submit(&self, endpoint: &str, payload: &SubmissionPayload) -> Option<SubmissionResult> {
        match self.post(endpoint, payload).await {
            Ok(result) => {
                info!(
                    "📨 提交完成 correct={:?} reason={:?} next={:?}",
                    result.correct, result.reason, result.next_url
                );
                Some(result)
            }
            Err(e) => {
                warn!("❌ 提交失败: {}", e);
                None
            }
        }
    }
}
