pub mod error;
pub mod retriever;
pub mod router;
pub mod rrf;

pub use error::{RetrievalError, RetrievalResult};
pub use retriever::retrieve_schema_context;
pub use router::{route_modules, RoutedModule};
pub use rrf::reciprocal_rank_fusion;
