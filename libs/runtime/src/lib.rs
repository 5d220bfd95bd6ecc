//! Process-level plumbing shared by apikit binaries: layered configuration and logging.

pub mod config;
pub mod home_dir;
pub mod logging;

pub use config::{AppConfig, CliOverrides, LoggingConfig, Section, ServerConfig};
pub use logging::init_logging_from_config;
