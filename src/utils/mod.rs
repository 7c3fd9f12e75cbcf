//! Utility modules shared by the CLI and the library

pub mod env;
pub mod error;
pub mod logging;

// Re-export commonly used items
pub use env::{env_opt, CONFIG_ENV};
pub use error::result_to_option;
pub use logging::{init_logging, init_logging_from_config};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
