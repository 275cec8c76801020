pub mod answer;
pub mod resource;
pub mod submission;
pub mod task;
pub mod trigger;

pub use answer::{Answer, NO_SOLUTION_SENTINEL};
pub use resource::{FetchedResource, FileKind};
pub use submission::{SubmissionPayload, SubmissionResult};
pub use task::{ChallengeTask, Identity};
pub use trigger::TriggerRequest;
