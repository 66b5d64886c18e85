pub mod difficulty;
pub mod error;
pub mod fake;
pub mod fence;
pub mod http;
pub mod prompt;
pub mod traits;

pub use difficulty::{classify_difficulty, k_for, Difficulty};
pub use error::{LlmError, LlmResult};
pub use fake::{FakeEmbeddingClient, FakeGeneratorClient};
pub use fence::strip_code_fence;
pub use http::{HttpEmbeddingClient, HttpGeneratorClient};
pub use prompt::build_base_prompt;
pub use traits::{EmbeddingClient, GeneratorClient};
