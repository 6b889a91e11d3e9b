//! CLI command implementations.

pub mod config;
pub mod users;

pub use config::run_config;
pub use users::run_users;
