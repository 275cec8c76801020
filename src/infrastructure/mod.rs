//! 基础设施层
//!
//! 持有稀缺资源（浏览器页面、HTTP 客户端），只对上层暴露两种能力：
//! - [`PageFetcher`]：抓取脚本渲染后的页面
//! - [`ResourceFetcher`]：下载附件字节并嗅探类型

pub mod page_fetcher;
pub mod resource_fetcher;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{ChallengeTask, FetchedResource};

pub use page_fetcher::ChromePageFetcher;
pub use resource_fetcher::HttpResourceFetcher;

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 导航到 `url`，返回渲染后的 HTML 和可见文本
    async fn fetch_rendered_page(&self, url: &str) -> AppResult<ChallengeTask>;
}

/// 附件下载能力
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> AppResult<FetchedResource>;
}
