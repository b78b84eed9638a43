//! # Veracity Config
//!
//! Configuration management for the Veracity shell.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::validate;
