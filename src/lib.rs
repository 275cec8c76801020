//! # Challenge Solver
//!
//! 自动求解网页挑战链的服务：收到触发请求后，打开挑战页面、
//! 找到提交地址、推断答案并提交，按响应中的下一题地址继续，直到没有下一题或达到跳转上限
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器 Page、HTTP 客户端），只暴露能力
//! - `ChromePageFetcher` - 会话唯一的 page owner，提供渲染后页面
//! - `HttpResourceFetcher` - 下载附件并嗅探类型
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个页面
//! - `EndpointResolver` - 提交地址解析
//! - `ExtractionChain` - 有序的答案提取策略链
//! - `SubmissionClient` - 答案提交
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个会话"的完整处理流程
//! - `LoopSession` - 跳转计数
//! - `ChallengeFlow` - 流程编排（resolve → extract → submit → follow）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/server` - 触发服务，校验请求
//! - `orchestrator/session_launcher` - 派发会话，管理浏览器生命周期
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromePageFetcher, HttpResourceFetcher, PageFetcher, ResourceFetcher};
pub use models::{Answer, ChallengeTask, Identity, SubmissionPayload, SubmissionResult};
pub use orchestrator::{start, AppState, SessionLauncher};
pub use services::{EndpointResolver, ExtractionChain, SubmissionClient};
pub use workflow::{ChallengeFlow, LoopSession, SessionOutcome};
