//! Custom extractors for Axum handlers.

pub mod uuid_path;
pub mod validated_json;

pub use uuid_path::{UuidPath, UuidPathPair, parse_path_uuid};
pub use validated_json::ValidatedJson;
