//! 页面抓取器 - 基础设施层
//!
//! 持有会话唯一的 page 资源，只暴露"打开页面并读取内容"的能力

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::PageFetcher;
use crate::models::ChallengeTask;

/// 读取页面可见文本的脚本
const INNER_TEXT_JS: &str = "document.documentElement ? document.documentElement.innerText : ''";

/// 基于 Chromium 的页面抓取器
///
/// 职责：
/// - 持有会话专用的浏览器和 Page
/// - 导航、等待前端脚本渲染、读取 HTML 和 innerText
/// - 不认识提交地址 / 答案
pub struct ChromePageFetcher {
    session: Mutex<Option<BrowserSession>>,
    page: Page,
    navigation_timeout: Duration,
    settle: Duration,
}

impl ChromePageFetcher {
    /// 按配置打开浏览器并创建空白页面
    pub async fn open(config: &Config) -> AppResult<Self> {
        let session = BrowserSession::open(config).await?;
        let page = match session.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // 创建页面失败也要释放浏览器
                session.shutdown().await;
                return Err(e.into());
            }
        };

        Ok(Self {
            session: Mutex::new(Some(session)),
            page,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            settle: Duration::from_millis(config.settle_ms),
        })
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 关闭页面并释放浏览器
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            warn!("关闭页面失败: {}", e);
        }
        if let Some(session) = self.session.lock().await.take() {
            session.shutdown().await;
        }
    }
}

#[async_trait]
impl PageFetcher for ChromePageFetcher {
    async fn fetch_rendered_page(&self, url: &str) -> AppResult<ChallengeTask> {
        info!("🌐 打开页面: {}", url);

        match timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(AppError::transport(url, e)),
            Err(_) => {
                return Err(AppError::transport(
                    url,
                    format!("页面导航超时 ({} 秒)", self.navigation_timeout.as_secs()),
                ))
            }
        }

        // 等待前端脚本填充内容
        sleep(self.settle).await;

        let html = self.page.content().await?;
        let rendered_text: Option<String> = self.eval_as(INNER_TEXT_JS).await?;
        let rendered_text = rendered_text.unwrap_or_default();

        debug!(
            "页面加载完成: HTML {} 字节, 文本 {} 字符",
            html.len(),
            rendered_text.chars().count()
        );

        Ok(ChallengeTask::new(url, html, rendered_text))
    }
}
