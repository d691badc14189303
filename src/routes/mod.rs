//! Routes shipped with the library.

mod common;
pub use common::common_routes_with_ready;
