//! Shared building blocks: the value model and the wire vocabulary.

mod constants;
mod value;

pub use constants::*;
pub use value::*;
