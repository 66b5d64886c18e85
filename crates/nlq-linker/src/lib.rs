pub mod gloss;
pub mod linker;

pub use gloss::{gloss_column, infer_type_hint, tokenize_identifier};
pub use linker::link_schema;
