//! 浏览器资源
//!
//! 每个会话持有一个 [`BrowserSession`]，在所有退出路径上调用 [`BrowserSession::shutdown`] 释放

pub mod connection;
pub mod headless;

use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AppResult;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

/// 浏览器连接及其事件处理任务
pub struct BrowserSession {
    pub browser: Browser,
    handler_task: JoinHandle<()>,
    /// 是否由本会话启动（需要负责关闭进程）
    owned: bool,
}

impl BrowserSession {
    pub(crate) fn new(browser: Browser, handler_task: JoinHandle<()>, owned: bool) -> Self {
        Self {
            browser,
            handler_task,
            owned,
        }
    }

    /// 按配置启动或连接浏览器
    pub async fn open(config: &Config) -> AppResult<Self> {
        match config.browser_debug_port {
            Some(port) => connect_to_browser(port).await,
            None => launch_headless_browser(config).await,
        }
    }

    /// 释放浏览器资源；错误只记录不返回
    pub async fn shutdown(mut self) {
        if self.owned {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
            debug!("浏览器已关闭");
        }
        self.handler_task.abort();
    }
}
