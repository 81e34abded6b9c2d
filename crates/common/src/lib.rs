//! Shared building blocks for the ticket service crates.
//! - Logging initialisation so every binary formats events the same way.
//! - Startup environment checks.
//! - Small wire types shared by the HTTP layer.

pub mod types;
pub mod utils;
pub mod env;
