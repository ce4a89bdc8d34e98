//! Configuration error types.

/// Errors that can occur when loading, saving, or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),
}

/// Errors from resolving the game directory.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not report a home directory.
    #[error("could not determine the user's home directory")]
    NoHomeDir,

    /// Creating a directory failed.
    #[error("failed to create {}: {source}", path.display())]
    Io {
        /// Directory being created.
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
