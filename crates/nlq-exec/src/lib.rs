pub mod error;
pub mod fake;
pub mod pg;
pub mod traits;

pub use error::{ExecError, ExecResult};
pub use fake::FakeExecutor;
pub use pg::PgExecutor;
pub use traits::Executor;
