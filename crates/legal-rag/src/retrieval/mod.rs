//! Vector storage and relevance gating

pub mod gate;
pub mod store;

pub use gate::{RelevanceGate, DEFAULT_MIN_SIMILARITY};
pub use store::{cosine_distance, SqliteVectorStore};
