//! Documents and the operations on a collection.

mod document;
mod document_collection;
pub mod operation;
mod options;

pub use document::*;
pub use document_collection::*;
pub use options::*;
