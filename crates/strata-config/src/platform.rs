//! Game directory resolution.
//!
//! Everything the tools read or write lives under one dotted directory whose
//! location follows each OS's convention for per-user application data. It is
//! resolved once at startup and passed down as a plain path.

use std::path::{Path, PathBuf};

use crate::error::PlatformError;

const DIR_NAME: &str = ".strata";

/// Directories under the game root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDirs {
    /// The game root itself.
    pub root: PathBuf,
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Log files.
    pub log_dir: PathBuf,
    /// One subdirectory per world.
    pub saves_dir: PathBuf,
}

impl GameDirs {
    /// Resolves the game root for the current OS without touching the disk.
    ///
    /// - **Windows**: `%APPDATA%\.strata`, or `~\.strata` if `APPDATA` is unset
    /// - **macOS**: `~/Library/Application Support/.strata`
    /// - **others**: `~/.strata`
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoHomeDir`] if the OS does not expose a home
    /// directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let home = dirs::home_dir().ok_or(PlatformError::NoHomeDir)?;
        let root = if cfg!(target_os = "windows") {
            std::env::var_os("APPDATA")
                .map(PathBuf::from)
                .unwrap_or(home)
                .join(DIR_NAME)
        } else if cfg!(target_os = "macos") {
            home.join("Library")
                .join("Application Support")
                .join(DIR_NAME)
        } else {
            home.join(DIR_NAME)
        };
        Ok(Self::with_root(&root))
    }

    /// Lays out directories under an explicit root.
    ///
    /// Used for `--data-dir` and in tests.
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config_dir: root.to_path_buf(),
            log_dir: root.join("logs"),
            saves_dir: root.join("saves"),
        }
    }

    /// Creates every directory on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Io`] naming the first directory that could not
    /// be created.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for dir in [&self.root, &self.config_dir, &self.log_dir, &self.saves_dir] {
            std::fs::create_dir_all(dir).map_err(|source| PlatformError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
