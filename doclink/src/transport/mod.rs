//! Transport boundary: requests, responses and the pluggable provider that
//! executes them.

mod request;
mod response;
#[allow(clippy::module_inception)]
mod transport;

pub use request::*;
pub use response::*;
pub use transport::*;
