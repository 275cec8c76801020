//! 会话启动器 - 编排层
//!
//! 每个被接受的触发请求对应一个独立的 tokio 任务：
//! 打开浏览器页面 → 跑完挑战循环 → 释放浏览器 → 记录结果

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromePageFetcher, HttpResourceFetcher, ResourceFetcher};
use crate::models::Identity;
use crate::services::{ExtractionChain, SubmissionClient};
use crate::workflow::{ChallengeFlow, LoopSession, SessionOutcome};

/// 会话启动能力
///
/// 只负责把会话派发出去，不等待结果
pub trait SessionLauncher: Send + Sync {
    fn launch(&self, identity: Identity, start_url: String);
}

/// 基于无头浏览器的会话启动器
pub struct ChromeSessionLauncher {
    config: Arc<Config>,
    next_id: AtomicU64,
}

impl ChromeSessionLauncher {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            next_id: AtomicU64::new(1),
        }
    }

    fn session_id(&self) -> String {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", chrono::Local::now().format("%H%M%S"), seq)
    }
}

impl SessionLauncher for ChromeSessionLauncher {
    fn launch(&self, identity: Identity, start_url: String) {
        let session_id = self.session_id();
        let worker = tokio::spawn(run_session(
            self.config.clone(),
            session_id.clone(),
            identity,
            start_url,
        ));

        // 会话任务 panic 时只记录日志
        tokio::spawn(async move {
            if let Err(e) = worker.await {
                error!("[会话 {}] 💥 会话任务异常退出: {}", session_id, e);
            }
        });
    }
}

/// 运行一个完整会话，任何结果都只记录日志
pub async fn run_session(
    config: Arc<Config>,
    session_id: String,
    identity: Identity,
    start_url: String,
) {
    let started = chrono::Local::now();
    info!("[会话 {}] 🚀 会话开始: {}", session_id, start_url);

    let pages = match ChromePageFetcher::open(&config).await {
        Ok(pages) => pages,
        Err(e) => {
            error!("[会话 {}] ❌ 无法打开浏览器页面: {}", session_id, e);
            return;
        }
    };

    let outcome = solve(&config, &pages, &session_id, &identity, &start_url).await;

    // 先释放浏览器再记录结果
    pages.close().await;

    let elapsed = (chrono::Local::now() - started).num_milliseconds() as f64 / 1000.0;
    match outcome {
        Ok(SessionOutcome::Completed { hops }) => info!(
            "[会话 {}] 🏁 会话完成，共跳转 {} 次，耗时 {:.1}s",
            session_id, hops, elapsed
        ),
        Ok(SessionOutcome::LimitReached { hops }) => warn!(
            "[会话 {}] ⏹️ 达到跳转上限 ({} 次)，耗时 {:.1}s",
            session_id, hops, elapsed
        ),
        Err(e) => error!(
            "[会话 {}] ❌ 会话失败: {}，耗时 {:.1}s",
            session_id, e, elapsed
        ),
    }
}

async fn solve(
    config: &Config,
    pages: &ChromePageFetcher,
    session_id: &str,
    identity: &Identity,
    start_url: &str,
) -> AppResult<SessionOutcome> {
    let resources: Arc<dyn ResourceFetcher> = Arc::new(HttpResourceFetcher::new(config)?);
    let submitter = Arc::new(SubmissionClient::new()?);
    let flow = ChallengeFlow::new(ExtractionChain::standard(resources), submitter);

    flow.run(pages, LoopSession::new(session_id), start_url, identity)
        .await
}
