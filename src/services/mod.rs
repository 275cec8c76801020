//! 业务能力层
//!
//! 每个服务只提供一种能力，不关心跳转循环

pub mod endpoint_resolver;
pub mod extraction;
pub mod submission_client;

pub use endpoint_resolver::{normalize_submit_url, EndpointResolver};
pub use extraction::{Extraction, ExtractionChain, ExtractionStrategy};
pub use submission_client::{AnswerSubmitter, SubmissionClient, SUBMIT_TIMEOUT};
