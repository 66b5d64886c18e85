pub mod autocorrect;
pub mod delta;
pub mod error;
pub mod levenshtein;
pub mod repair;

pub use autocorrect::autocorrect_hints;
pub use delta::render_delta_prompt;
pub use error::{RepairError, RepairResult};
pub use repair::{build_next_attempt, can_retry, classify, confidence_penalty, RepairDecision};
