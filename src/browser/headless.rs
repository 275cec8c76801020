use std::path::Path;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::error::{AppResult, BrowserError};

/// 启动一个会话专用的无头浏览器
pub async fn launch_headless_browser(config: &Config) -> AppResult<BrowserSession> {
    info!("🚀 启动无头浏览器...");
    debug!("浏览器路径: {}", config.chrome_executable);

    // 配置无头浏览器
    let browser_config = BrowserConfig::builder()
        .new_headless_mode()
        .chrome_executable(Path::new(&config.chrome_executable))
        .request_timeout(Duration::from_secs(config.navigation_timeout_secs))
        .args(vec![
            "--no-sandbox",              // 容器内没有沙盒权限
            "--disable-setuid-sandbox",
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--disable-gpu",
        ])
        .build()
        .map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            BrowserError::LaunchFailed(e)
        })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        BrowserError::LaunchFailed(e.to_string())
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok(BrowserSession::new(browser, handler_task, true))
}
