use serde::Deserialize;

use crate::models::task::Identity;

/// 入站触发请求
///
/// 字段都是可选的，缺失由处理函数统一返回 400
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerRequest {
    pub email: Option<String>,
    pub secret: Option<String>,
    pub url: Option<String>,
}

impl TriggerRequest {
    /// 三个字段都存在且非空时返回 (身份, 起始地址)
    pub fn into_parts(self) -> Option<(Identity, String)> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let email = non_empty(self.email)?;
        let secret = non_empty(self.secret)?;
        let url = non_empty(self.url)?;
        Some((Identity { email, secret }, url.trim().to_string()))
    }
}
