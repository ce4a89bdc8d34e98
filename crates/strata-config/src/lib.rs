//! Configuration for the strata tools.
//!
//! Settings persist to disk as `config.ron`, can be overridden from the
//! command line via clap, and tolerate missing or unknown fields so old and
//! new config files keep loading.

mod cli;
mod config;
mod error;
pub mod platform;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, Config, DebugConfig, StorageConfig};
pub use error::{ConfigError, PlatformError};
pub use platform::GameDirs;
