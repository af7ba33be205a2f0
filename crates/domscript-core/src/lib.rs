pub mod config_manager;
pub mod error;
pub mod types;
pub mod validation_config;

pub use config_manager::*;
pub use error::*;
pub use types::*;
pub use validation_config::*;
