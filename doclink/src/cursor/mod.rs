//! Query cursors: lazily paginated results with optional batch retry.

mod cursor_entity;
mod query_cursor;
mod query_options;

pub(crate) use cursor_entity::{CursorEntity, CursorExtra, CursorRequest, CursorRequestOptions};
pub use cursor_entity::{CursorStats, CursorWarning};
pub use query_cursor::{Cursor, CursorState};
pub(crate) use query_cursor::open_cursor;
pub use query_options::*;
