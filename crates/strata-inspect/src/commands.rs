//! The inspection subcommands. Each writes plain text to `out`.

use std::io::{self, Write};
use std::path::Path;

use strata_storage::{
    FieldValue, RegionFileStore, StorageError, WorldDirectory, WorldMetadataStore, list_worlds,
};
use strata_voxel::RegionPos;

/// Errors from running a subcommand.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// No world directory with this name exists.
    #[error("world '{0}' not found")]
    WorldNotFound(String),

    /// The world exists but has no `world.dat`.
    #[error("world '{0}' has no world.dat")]
    NoWorldData(String),

    /// Reading the save failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Writing the report failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl InspectError {
    /// True when the disk or the output stream failed, as opposed to the
    /// save being missing or malformed.
    pub fn is_io(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_io(),
            Self::Output(_) => true,
            Self::WorldNotFound(_) | Self::NoWorldData(_) => false,
        }
    }
}

/// Prints one world name per line.
pub fn worlds(root: &Path, out: &mut impl Write) -> Result<(), InspectError> {
    let names = list_worlds(root)?;
    if names.is_empty() {
        writeln!(out, "no worlds under {}", root.display())?;
    }
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Prints the contents of a world's `world.dat`.
pub fn world_info(root: &Path, world: &str, out: &mut impl Write) -> Result<(), InspectError> {
    let dir = open_existing(root, world)?;
    let data = WorldMetadataStore::new(&dir)
        .load()?
        .ok_or_else(|| InspectError::NoWorldData(world.to_string()))?;

    writeln!(out, "world:             {}", dir.name())?;
    writeln!(out, "seed:              {}", data.seed)?;
    writeln!(
        out,
        "spawn:             ({:.2}, {:.2}, {:.2}) yaw {:.3} pitch {:.3}",
        data.x, data.y, data.z, data.yaw, data.pitch
    )?;
    writeln!(out, "game time:         {:.2}", data.game_time)?;
    writeln!(out, "day:               {}", data.day_counter)?;
    writeln!(out, "dimension:         {}", data.local_dimension)?;
    writeln!(
        out,
        "debug:             noclip={} fly={} fullbright={} borders={} xray={}",
        data.debug_noclip,
        data.debug_fly,
        data.debug_fullbright,
        data.show_chunk_borders,
        data.debug_xray
    )?;
    for field in &data.extra_fields {
        let value = match &field.value {
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::Str(v) => format!("{v:?}"),
        };
        writeln!(out, "extra {}: {}", field.name, value)?;
    }
    Ok(())
}

/// Prints the occupied slots of one region file.
pub fn region(
    root: &Path,
    world: &str,
    dimension: &str,
    pos: RegionPos,
    out: &mut impl Write,
) -> Result<(), InspectError> {
    let store = RegionFileStore::new(open_existing(root, world)?);
    let Some(slots) = store.slot_table(pos, dimension)? else {
        writeln!(out, "no region file {}", pos.file_name())?;
        return Ok(());
    };

    let mut used = 0usize;
    let mut bytes = 0u64;
    for (slot, entry) in slots.iter().enumerate() {
        if !entry.is_present() {
            continue;
        }
        let chunk = pos.chunk_at_slot(slot);
        writeln!(
            out,
            "slot {slot:4}  chunk ({:5}, {:5})  offset {:8}  length {:6}",
            chunk.x, chunk.z, entry.offset, entry.length
        )?;
        used += 1;
        bytes += u64::from(entry.length);
    }
    writeln!(
        out,
        "{}: {used}/{} slots used, {bytes} payload bytes",
        pos.file_name(),
        slots.len()
    )?;
    Ok(())
}

/// Opens a world only if it already exists, so inspecting never creates one.
fn open_existing(root: &Path, world: &str) -> Result<WorldDirectory, InspectError> {
    if !list_worlds(root)?.iter().any(|name| name == world) {
        return Err(InspectError::WorldNotFound(world.to_string()));
    }
    Ok(WorldDirectory::open(root, world)?)
}
