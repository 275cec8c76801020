pub mod challenge_ctx;
pub mod challenge_flow;

pub use challenge_ctx::{LoopSession, MAX_HOPS};
pub use challenge_flow::{ChallengeFlow, SessionOutcome};
