pub mod config;
pub mod types;

pub use config::ServiceConfig;
pub use types::*;
