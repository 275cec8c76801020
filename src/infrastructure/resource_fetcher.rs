use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::ResourceFetcher;
use crate::models::FetchedResource;

/// 附件下载器
///
/// 普通 HTTP GET，不经过浏览器；下载后按字节签名嗅探类型
#[derive(Clone)]
pub struct HttpResourceFetcher {
    client: reqwest::Client,
}

impl HttpResourceFetcher {
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_timeout(Duration::from_secs(config.download_timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch_bytes(&self, url: &str) -> AppResult<FetchedResource> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::transport(url, e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::transport(url, e))?;

        let resource = FetchedResource::new(url, bytes.to_vec());
        debug!(
            "下载完成: {} ({} 字节, 类型 {:?})",
            url,
            resource.bytes.len(),
            resource.kind
        );
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_and_sniff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("name,value\na,1\n"))
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::with_timeout(Duration::from_secs(5)).unwrap();
        let resource = fetcher
            .fetch_bytes(&format!("{}/data.csv", server.uri()))
            .await
            .unwrap();

        assert_eq!(resource.kind, Some(FileKind::Tabular));
        assert_eq!(resource.bytes, b"name,value\na,1\n");
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpResourceFetcher::with_timeout(Duration::from_secs(5)).unwrap();
        let result = fetcher
            .fetch_bytes(&format!("{}/missing.pdf", server.uri()))
            .await;

        assert!(matches!(result, Err(AppError::Transport { .. })));
    }
}
