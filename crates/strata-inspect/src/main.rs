//! Offline inspection of strata saves.
//!
//! Lists worlds, dumps `world.dat`, and prints region slot tables without
//! modifying any save.
//!
//! Run with: `cargo run -p strata-inspect -- worlds`

mod commands;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use strata_config::{CliArgs, Config, GameDirs};
use strata_voxel::RegionPos;
use tracing::{debug, error};

/// Exit status for disk and output failures (`EX_IOERR`).
const EXIT_IO_ERROR: u8 = 74;

/// CLI arguments for the inspector.
#[derive(Parser, Debug)]
#[command(name = "strata-inspect", about = "Inspect strata world saves")]
struct InspectArgs {
    #[command(flatten)]
    common: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the worlds under the saves directory.
    Worlds,
    /// Print the world's world.dat.
    WorldInfo,
    /// Print the occupied slots of one region file.
    Region {
        /// Region X coordinate.
        #[arg(allow_negative_numbers = true)]
        rx: i32,
        /// Region Z coordinate.
        #[arg(allow_negative_numbers = true)]
        rz: i32,
        /// Dimension (defaults to the configured one).
        #[arg(long)]
        dimension: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = InspectArgs::parse();

    let config = match load_config(&args.common) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("strata-inspect: {e}");
            return ExitCode::FAILURE;
        }
    };

    strata_log::init_logging(None, false, Some(&config));

    let root = match config.data_root() {
        Ok(root) => root,
        Err(e) => {
            error!("cannot resolve game directory: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(root = %root.display(), world = %config.storage.world, "inspecting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let world = config.storage.world.as_str();
    let result = match &args.command {
        Command::Worlds => commands::worlds(&root, &mut out),
        Command::WorldInfo => commands::world_info(&root, world, &mut out),
        Command::Region { rx, rz, dimension } => {
            let dimension = dimension
                .as_deref()
                .unwrap_or(config.storage.default_dimension.as_str());
            commands::region(&root, world, dimension, RegionPos::new(*rx, *rz), &mut out)
        }
    };

    let _ = out.flush();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_io() => {
            error!(root = %root.display(), "disk error: {}", e);
            ExitCode::from(EXIT_IO_ERROR)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads `config.ron` from `--config`, else from the game root, and applies
/// the command-line overrides on top.
fn load_config(args: &CliArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let config_dir: PathBuf = match (&args.config, &args.data_dir) {
        (Some(dir), _) => dir.clone(),
        (None, Some(root)) => GameDirs::with_root(root).config_dir,
        (None, None) => GameDirs::resolve()?.config_dir,
    };
    let mut config = Config::load_or_create(&config_dir)?;
    config.apply_cli_overrides(args);
    Ok(config)
}
