pub mod routes;
pub mod startup;
pub mod errors;
pub mod identity;
pub mod openapi;

pub use startup::run_with_shutdown;
