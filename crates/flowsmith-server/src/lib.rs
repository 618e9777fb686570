pub mod config;
pub mod logging;
mod routes;

pub use routes::*;
