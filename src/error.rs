use thiserror::Error;

/// 应用程序错误类型
///
/// 会话内的错误分两类：
/// - 只影响单个策略 / 单个候选文件的错误（`Parse`、下载时的 `Transport`），就地吸收
/// - 终止整个会话的错误（`Resolution`、`Submit`、页面抓取时的 `Transport`）
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// secret 校验失败
    #[error("鉴权失败: secret 不匹配")]
    Authorization,

    /// 找不到可用的提交地址
    #[error("无法解析提交地址: {reason}")]
    Resolution { reason: String },

    /// 网络请求失败（页面抓取、文件下载、答案提交）
    #[error("网络请求失败 ({url}): {message}")]
    Transport { url: String, message: String },

    /// 内容解析失败（编码载荷、表格、CSV、工作簿、PDF）
    #[error("解析失败 ({what}): {message}")]
    Parse { what: &'static str, message: String },

    /// 无头浏览器错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),

    /// 提交没有得到任何结果
    #[error("答案提交失败: {endpoint}")]
    Submit { endpoint: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 服务端没有配置 SECRET
    #[error("未配置 SECRET，拒绝所有触发请求")]
    MissingSecret,

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 无效: {message}")]
    FileInvalid { path: String, message: String },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动无头浏览器失败
    #[error("启动无头浏览器失败: {0}")]
    LaunchFailed(String),

    /// 连接已有浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },

    /// CDP 调用失败
    #[error("CDP 调用失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::Cdp(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::parse("json", err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::FileInvalid {
            path: String::new(), // TOML 错误本身不带路径
            message: err.to_string(),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建解析错误
    pub fn parse(what: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Parse {
            what,
            message: err.to_string(),
        }
    }

    /// 创建网络请求错误
    pub fn transport(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    /// 创建提交地址解析错误
    pub fn resolution(reason: impl Into<String>) -> Self {
        AppError::Resolution {
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AppError::resolution("页面中没有 submit 地址");
        assert_eq!(err.to_string(), "无法解析提交地址: 页面中没有 submit 地址");

        let err: AppError = ConfigError::MissingSecret.into();
        assert!(matches!(err, AppError::Config(ConfigError::MissingSecret)));
    }

    #[test]
    fn test_json_error_becomes_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(err, AppError::Parse { what: "json", .. }));
    }
}
