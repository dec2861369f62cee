//! Revision and overwrite policy: optimistic concurrency checks, create-time
//! conflict resolution, merge semantics and key validation. No I/O.

mod overwrite_mode;
mod precondition;
mod resolver;

pub use overwrite_mode::*;
pub use precondition::*;
pub use resolver::*;
