//! Person endpoints and the service behind them.

mod controller;
mod service;

pub use controller::person_routes;
pub use service::PersonService;
