//! Region files: up to 1024 compressed chunks behind a fixed slot table.
//!
//! ## File Layout
//!
//! | Bytes | Content |
//! |-------|---------|
//! | `[0, 8192)` | 1024 × (`offset: u32 LE`, `length: u32 LE`), indexed by `local_x + 32 * local_z` |
//! | `[8192, EOF)` | chunk payloads in [`strata_voxel::codec`] format |
//!
//! An offset of 0 marks an empty slot. A payload that grows past its recorded
//! length is appended at end-of-file; one that still fits is overwritten in
//! place. Space abandoned by a move is never reclaimed.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use strata_voxel::{Chunk, ChunkPos, REGION_SLOTS, RegionPos, compress, decompress};

use crate::error::StorageError;
use crate::locks::RegionLocks;
use crate::world_dir::WorldDirectory;

/// Size of the slot table at the start of every region file.
pub const HEADER_BYTES: u64 = (REGION_SLOTS * SLOT_BYTES) as u64;

const SLOT_BYTES: usize = 8;

/// Location of one chunk payload inside a region file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlotEntry {
    /// Byte offset of the payload, 0 if the chunk was never saved.
    pub offset: u32,
    /// Payload length in bytes.
    pub length: u32,
}

impl SlotEntry {
    /// True if this slot refers to a stored chunk.
    pub fn is_present(&self) -> bool {
        self.offset != 0 && self.length > 0
    }

    fn from_bytes(bytes: [u8; SLOT_BYTES]) -> Self {
        Self {
            offset: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            length: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    fn to_bytes(self) -> [u8; SLOT_BYTES] {
        let mut bytes = [0u8; SLOT_BYTES];
        bytes[..4].copy_from_slice(&self.offset.to_le_bytes());
        bytes[4..].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }
}

/// Saves and loads chunks in the region files of one world.
///
/// Each call opens and closes its region file while holding that file's lock
/// from the shared [`RegionLocks`] table.
#[derive(Clone, Debug)]
pub struct RegionFileStore {
    world: WorldDirectory,
    locks: RegionLocks,
}

impl RegionFileStore {
    /// Creates a store with its own lock table.
    pub fn new(world: WorldDirectory) -> Self {
        Self::with_locks(world, RegionLocks::new())
    }

    /// Creates a store sharing an existing lock table.
    pub fn with_locks(world: WorldDirectory, locks: RegionLocks) -> Self {
        Self { world, locks }
    }

    /// The world this store writes into.
    pub fn world(&self) -> &WorldDirectory {
        &self.world
    }

    /// Path of the region file holding `region` in `dimension`.
    pub fn region_path(&self, dimension: &str, region: RegionPos) -> Result<PathBuf, StorageError> {
        self.world.region_path(dimension, region)
    }

    /// Compresses and stores `chunk` in its region file.
    pub fn save(&self, chunk: &Chunk, dimension: &str) -> Result<(), StorageError> {
        let pos = chunk.pos();
        let path = self.region_path(dimension, pos.region())?;
        let payload = compress(chunk);

        self.locks
            .with_lock(&path, || write_chunk(&path, pos.slot_index(), &payload))
            .inspect_err(|e| {
                tracing::error!(cx = pos.x, cz = pos.z, dimension, "failed to save chunk: {e}");
            })
    }

    /// Loads the chunk at `pos`, or `Ok(None)` if it was never saved.
    pub fn load(&self, pos: ChunkPos, dimension: &str) -> Result<Option<Chunk>, StorageError> {
        let path = self.region_path(dimension, pos.region())?;

        let payload = self
            .locks
            .with_lock(&path, || read_chunk(&path, pos.slot_index()))
            .inspect_err(|e| {
                tracing::error!(cx = pos.x, cz = pos.z, dimension, "failed to load chunk: {e}");
            })?;
        Ok(payload.map(|bytes| decompress(&bytes, pos)))
    }

    /// The full slot table of a region file, or `Ok(None)` if the file is
    /// missing or shorter than its header.
    pub fn slot_table(
        &self,
        region: RegionPos,
        dimension: &str,
    ) -> Result<Option<Vec<SlotEntry>>, StorageError> {
        let path = self.region_path(dimension, region)?;

        self.locks.with_lock(&path, || read_slot_table(&path))
    }
}

/// Reads the 1024 slot entries of the region file at `path`.
fn read_slot_table(path: &Path) -> Result<Option<Vec<SlotEntry>>, StorageError> {
    let Some(mut file) = open_existing(path)? else {
        return Ok(None);
    };
    let io = |e| StorageError::io(path, e);
    let mut header = vec![0u8; HEADER_BYTES as usize];
    file.seek(SeekFrom::Start(0)).map_err(io)?;
    file.read_exact(&mut header).map_err(io)?;

    let slots = header
        .chunks_exact(SLOT_BYTES)
        .map(|b| SlotEntry::from_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();
    Ok(Some(slots))
}

/// Writes `payload` into `slot`, creating and zero-filling the header as needed.
fn write_chunk(path: &Path, slot: usize, payload: &[u8]) -> Result<(), StorageError> {
    let io = |e| StorageError::io(path, e);

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    }
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(io)?;

    let mut file_len = file.metadata().map_err(io)?.len();
    if file_len < HEADER_BYTES {
        file.seek(SeekFrom::Start(0)).map_err(io)?;
        file.write_all(&[0u8; HEADER_BYTES as usize]).map_err(io)?;
        file_len = HEADER_BYTES;
    }

    let current = read_slot(&mut file, slot).map_err(io)?;
    let length = payload.len() as u32;

    let entry = if current.offset == 0 || length > current.length {
        let offset = u32::try_from(file_len).map_err(|_| StorageError::SlotOverflow {
            path: path.to_path_buf(),
            offset: file_len,
        })?;
        tracing::trace!(slot, offset, length, "appending chunk payload");
        SlotEntry { offset, length }
    } else {
        tracing::trace!(slot, offset = current.offset, length, "overwriting chunk payload in place");
        SlotEntry {
            offset: current.offset,
            length,
        }
    };

    // Payload first, so a torn write never leaves the slot pointing at garbage.
    file.seek(SeekFrom::Start(u64::from(entry.offset))).map_err(io)?;
    file.write_all(payload).map_err(io)?;
    file.seek(SeekFrom::Start((slot * SLOT_BYTES) as u64)).map_err(io)?;
    file.write_all(&entry.to_bytes()).map_err(io)?;
    Ok(())
}

/// Reads the raw payload stored in `slot`, if any.
fn read_chunk(path: &Path, slot: usize) -> Result<Option<Vec<u8>>, StorageError> {
    let Some(mut file) = open_existing(path)? else {
        return Ok(None);
    };
    let io = |e| StorageError::io(path, e);

    let entry = read_slot(&mut file, slot).map_err(io)?;
    if !entry.is_present() {
        return Ok(None);
    }

    let file_len = file.metadata().map_err(io)?.len();
    if u64::from(entry.offset) + u64::from(entry.length) > file_len {
        return Err(StorageError::CorruptSlot {
            path: path.to_path_buf(),
            slot,
            offset: entry.offset,
            length: entry.length,
        });
    }

    let mut payload = vec![0u8; entry.length as usize];
    file.seek(SeekFrom::Start(u64::from(entry.offset))).map_err(io)?;
    file.read_exact(&mut payload).map_err(io)?;
    Ok(Some(payload))
}

/// Opens a region file for reading; `None` if it is missing or has no full header.
fn open_existing(path: &Path) -> Result<Option<File>, StorageError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    let len = file.metadata().map_err(|e| StorageError::io(path, e))?.len();
    if len < HEADER_BYTES {
        tracing::debug!(path = %path.display(), len, "region file shorter than header");
        return Ok(None);
    }
    Ok(Some(file))
}

fn read_slot(file: &mut File, slot: usize) -> std::io::Result<SlotEntry> {
    let mut bytes = [0u8; SLOT_BYTES];
    file.seek(SeekFrom::Start((slot * SLOT_BYTES) as u64))?;
    file.read_exact(&mut bytes)?;
    Ok(SlotEntry::from_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
