//! 触发服务 - 编排层
//!
//! - `GET /`：健康检查
//! - `POST /api/quiz-webhook`：校验触发请求，接受后派发会话并立即返回

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::TriggerRequest;
use crate::orchestrator::session_launcher::{ChromeSessionLauncher, SessionLauncher};

/// 处理函数共享的状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub launcher: Arc<dyn SessionLauncher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/quiz-webhook", post(quiz_webhook))
        .with_state(state)
}

/// 启动服务，阻塞直到服务退出
pub async fn start(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let launcher = Arc::new(ChromeSessionLauncher::new(config.clone()));
    let state = AppState {
        config: config.clone(),
        launcher,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法监听端口 {}", config.port))?;
    info!("🌍 服务已启动: http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .context("服务异常退出")?;
    Ok(())
}

async fn health() -> &'static str {
    "challenge_solver is running"
}

/// 触发入口
///
/// 校验顺序：JSON → 必填字段 → 服务端 secret 配置 → secret 匹配
pub async fn quiz_webhook(
    State(state): State<AppState>,
    payload: Result<Json<TriggerRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("❗ 触发请求不是合法 JSON: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    let Some((identity, start_url)) = request.into_parts() else {
        warn!("❗ 触发请求缺少字段");
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing fields (email, secret, url required)",
        );
    };

    match authorize(&state.config, &identity.secret) {
        Ok(()) => {}
        Err(AppError::Config(e)) => {
            warn!("❗ {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server misconfiguration");
        }
        Err(e) => {
            warn!("🚫 {} ({})", e, identity.email);
            return error_response(StatusCode::FORBIDDEN, "Invalid secret");
        }
    }

    info!("📥 接受触发: {} → {}", identity.email, start_url);
    state.launcher.launch(identity, start_url);

    (StatusCode::OK, Json(json!({ "status": "accepted" }))).into_response()
}

/// 对比请求中的 secret 和服务端配置
pub fn authorize(config: &Config, provided: &str) -> AppResult<()> {
    let expected = config.secret.as_deref().ok_or(ConfigError::MissingSecret)?;
    if expected == provided {
        Ok(())
    } else {
        Err(AppError::Authorization)
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;
    use serde_json::Value as JsonValue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<(Identity, String)>>,
    }

    impl SessionLauncher for RecordingLauncher {
        fn launch(&self, identity: Identity, start_url: String) {
            self.launched.lock().unwrap().push((identity, start_url));
        }
    }

    fn state(secret: Option<&str>) -> (AppState, Arc<RecordingLauncher>) {
        let launcher = Arc::new(RecordingLauncher::default());
        let config = Config {
            secret: secret.map(str::to_string),
            ..Config::default()
        };
        let state = AppState {
            config: Arc::new(config),
            launcher: launcher.clone(),
        };
        (state, launcher)
    }

    fn trigger(secret: &str) -> TriggerRequest {
        TriggerRequest {
            email: Some("me@example.com".into()),
            secret: Some(secret.into()),
            url: Some("https://quiz.example.com/start".into()),
        }
    }

    async fn call(state: AppState, request: TriggerRequest) -> (StatusCode, JsonValue) {
        let response = quiz_webhook(State(state), Ok(Json(request))).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_accepts_matching_secret() {
        let (state, launcher) = state(Some("s3cret"));
        let (status, body) = call(state, trigger("s3cret")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "accepted" }));
        let launched = launcher.launched.lock().unwrap();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].1, "https://quiz.example.com/start");
    }

    #[tokio::test]
    async fn test_rejects_wrong_secret() {
        let (state, launcher) = state(Some("s3cret"));
        let (status, body) = call(state, trigger("guess")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Invalid secret" }));
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_server_secret_is_misconfiguration() {
        let (state, launcher) = state(None);
        let (status, body) = call(state, trigger("anything")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Server misconfiguration" }));
        assert!(launcher.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_empty_fields() {
        let (state, _) = state(Some("s3cret"));
        let request = TriggerRequest {
            url: Some("  ".into()),
            ..trigger("s3cret")
        };
        let (status, body) = call(state, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Missing fields (email, secret, url required)" })
        );
    }

    #[tokio::test]
    async fn test_invalid_json_over_http() {
        let (state, launcher) = state(Some("s3cret"));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/api/quiz-webhook", addr))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: JsonValue = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Invalid JSON" }));

        let health = client.get(format!("http://{}/", addr)).send().await.unwrap();
        assert_eq!(health.status().as_u16(), 200);
        assert!(launcher.launched.lock().unwrap().is_empty());
    }
}
