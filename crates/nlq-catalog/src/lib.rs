pub mod error;
pub mod fake;
pub mod pg;
pub mod rebuild;
pub mod traits;

pub use error::{CatalogError, CatalogResult};
pub use fake::FakeCatalogStore;
pub use pg::PgCatalogStore;
pub use rebuild::{rebuild_from, RebuildInput, TableIngestRow};
pub use traits::{CatalogStore, SearchHit};
