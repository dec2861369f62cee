mod bulk_engine;
mod bulk_result;
mod document_entity;

pub(crate) use bulk_engine::*;
pub use bulk_result::*;
pub use document_entity::*;
