//! Command-line arguments shared by the strata tools.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Common command-line arguments.
///
/// CLI values override settings loaded from `config.ron`. Flatten this into a
/// tool's own parser with `#[command(flatten)]`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    /// Game root directory (overrides the platform default).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// World to operate on.
    #[arg(long, global = true)]
    pub world: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.data_dir {
            self.storage.data_dir = Some(dir.clone());
        }
        if let Some(ref world) = args.world {
            self.storage.world = world.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        common: CliArgs,
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            world: Some("creative".to_string()),
            log_level: Some("trace".to_string()),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.storage.world, "creative");
        assert_eq!(config.debug.log_level, "trace");
        // Non-overridden fields retain defaults
        assert_eq!(config.storage.data_dir, None);
        assert_eq!(config.storage.default_dimension, "overworld");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_parse_flags() {
        let cli = TestCli::parse_from(["strata", "--data-dir", "/tmp/g", "--world", "w2"]);
        assert_eq!(cli.common.data_dir, Some(PathBuf::from("/tmp/g")));
        assert_eq!(cli.common.world.as_deref(), Some("w2"));
        assert_eq!(cli.common.config, None);
    }
}
