//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 接收触发请求，为每个被接受的请求派发一个独立会话，并管理会话的浏览器资源。
//!
//! ## 模块划分
//!
//! ### `server` - 触发服务
//! - 校验 JSON、必填字段和 secret
//! - 接受后立即返回，不等待会话结果
//!
//! ### `session_launcher` - 会话启动器
//! - 每个会话一个 tokio 任务
//! - 打开并在所有退出路径上释放浏览器
//! - 记录会话结果和耗时
//!
//! ## 层次关系
//!
//! ```text
//! server (处理触发请求)
//!     ↓
//! session_launcher (处理单个会话)
//!     ↓
//! workflow::ChallengeFlow (跳转循环)
//!     ↓
//! services (能力层：resolve / extract / submit)
//!     ↓
//! infrastructure (基础设施：PageFetcher / ResourceFetcher)
//! ```

pub mod server;
pub mod session_launcher;

pub use server::{authorize, router, start, AppState};
pub use session_launcher::{ChromeSessionLauncher, SessionLauncher};
