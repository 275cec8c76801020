use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
///
/// 启动时加载一次，之后以 `Arc<Config>` 注入各层，核心逻辑不直接读取环境变量
#[derive(Clone, Debug)]
pub struct Config {
    /// 触发请求需要匹配的 secret，未配置时拒绝所有触发
    pub secret: Option<String>,
    /// 监听端口
    pub port: u16,
    /// Chromium 可执行文件路径
    pub chrome_executable: String,
    /// 已运行浏览器的调试端口；设置后不再启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 页面导航超时（秒）
    pub navigation_timeout_secs: u64,
    /// 页面加载后等待前端脚本渲染的时间（毫秒）
    pub settle_ms: u64,
    /// 附件下载超时（秒）
    pub download_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret: None,
            port: 7860,
            chrome_executable: "/usr/bin/chromium".to_string(),
            browser_debug_port: None,
            navigation_timeout_secs: 60,
            settle_ms: 700,
            download_timeout_secs: 30,
            verbose_logging: false,
        }
    }
}

/// 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    secret: Option<String>,
    port: Option<u16>,
    chrome_executable: Option<String>,
    browser_debug_port: Option<u16>,
    navigation_timeout_secs: Option<u64>,
    settle_ms: Option<u64>,
    download_timeout_secs: Option<u64>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 优先级：环境变量 > 配置文件（`SOLVER_CONFIG`，默认 `solver.toml`）> 默认值
    pub fn from_env() -> AppResult<Self> {
        let path = std::env::var("SOLVER_CONFIG").unwrap_or_else(|_| "solver.toml".to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// 从 TOML 文件加载配置，文件中未出现的字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileInvalid {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            crate::AppError::Config(ConfigError::FileInvalid { message, .. }) => {
                ConfigError::FileInvalid {
                    path: path.to_string(),
                    message,
                }
                .into()
            }
            other => other,
        })
    }

    /// 解析 TOML 配置文本
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            secret: file.secret.filter(|s| !s.is_empty()),
            port: file.port.unwrap_or(default.port),
            chrome_executable: file.chrome_executable.unwrap_or(default.chrome_executable),
            browser_debug_port: file.browser_debug_port,
            navigation_timeout_secs: file
                .navigation_timeout_secs
                .unwrap_or(default.navigation_timeout_secs),
            settle_ms: file.settle_ms.unwrap_or(default.settle_ms),
            download_timeout_secs: file
                .download_timeout_secs
                .unwrap_or(default.download_timeout_secs),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    /// 用环境变量覆盖已有配置
    ///
    /// `lookup` 抽象了环境变量读取，便于测试
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        if let Some(secret) = lookup("SECRET").filter(|s| !s.is_empty()) {
            self.secret = Some(secret);
        }
        if let Some(port) = parse_var(&lookup, "PORT", "u16")? {
            self.port = port;
        }
        if let Some(path) = lookup("CHROME_EXECUTABLE").or_else(|| lookup("PUPPETEER_EXECUTABLE_PATH")) {
            self.chrome_executable = path;
        }
        if let Some(port) = parse_var(&lookup, "BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(port);
        }
        if let Some(secs) = parse_var(&lookup, "NAVIGATION_TIMEOUT_SECS", "u64")? {
            self.navigation_timeout_secs = secs;
        }
        if let Some(ms) = parse_var(&lookup, "SETTLE_MS", "u64")? {
            self.settle_ms = ms;
        }
        if let Some(secs) = parse_var(&lookup, "DOWNLOAD_TIMEOUT_SECS", "u64")? {
            self.download_timeout_secs = secs;
        }
        if let Some(verbose) = parse_var(&lookup, "VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = verbose;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
    }
}
