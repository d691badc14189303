pub mod loader;
pub mod properties;
pub mod validator;

pub use properties::*;
pub use validator::*;
