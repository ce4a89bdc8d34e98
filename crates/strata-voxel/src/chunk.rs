//! Fixed-size 16×128×16 voxel column with a parallel per-voxel metadata array.
//!
//! Cells are laid out so that each 16-high section is contiguous:
//! `index = (y * 16 + z) * 16 + x`. Section `s` therefore spans
//! `[s * SECTION_VOLUME, (s + 1) * SECTION_VOLUME)`.

use crate::coords::{ChunkPos, CoordError};

/// Horizontal side length of a chunk in voxels.
pub const CHUNK_WIDTH: usize = 16;

/// Vertical extent of a chunk in voxels.
pub const CHUNK_HEIGHT: usize = 128;

/// Total number of cells in a chunk (16 × 128 × 16).
pub const CHUNK_VOLUME: usize = CHUNK_WIDTH * CHUNK_HEIGHT * CHUNK_WIDTH;

/// Height of one network section.
pub const SECTION_HEIGHT: usize = 16;

/// Number of cells in one 16×16×16 section.
pub const SECTION_VOLUME: usize = CHUNK_WIDTH * SECTION_HEIGHT * CHUNK_WIDTH;

/// Number of sections stacked in a chunk.
pub const SECTION_COUNT: usize = CHUNK_HEIGHT / SECTION_HEIGHT;

/// Errors raised when assembling a chunk from caller-supplied arrays.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkError {
    /// An array did not hold exactly [`CHUNK_VOLUME`] (or [`SECTION_VOLUME`]) cells.
    #[error("{array} array has {actual} cells, expected {expected}")]
    WrongLength {
        /// Which array was wrong (`"blocks"` or `"metadata"`).
        array: &'static str,
        /// Required cell count.
        expected: usize,
        /// Supplied cell count.
        actual: usize,
    },
    /// A section index was out of range.
    #[error(transparent)]
    Coord(#[from] CoordError),
}

/// One chunk of voxel colours plus per-voxel metadata.
///
/// Both arrays always hold exactly [`CHUNK_VOLUME`] cells. The `modified` and
/// `has_blocks` flags are caller-owned bookkeeping and are never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pos: ChunkPos,
    blocks: Box<[i32]>,
    metadata: Box<[u8]>,
    /// Set by gameplay when the chunk has unsaved edits.
    pub modified: bool,
    /// True when at least one voxel is non-zero (not air).
    pub has_blocks: bool,
}

impl Chunk {
    /// Creates an all-air chunk at `pos`.
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            metadata: vec![0; CHUNK_VOLUME].into_boxed_slice(),
            modified: false,
            has_blocks: false,
        }
    }

    /// Builds a chunk from full-size arrays.
    ///
    /// `has_blocks` is derived from the voxel data; `modified` starts clear.
    pub fn from_arrays(
        pos: ChunkPos,
        blocks: Vec<i32>,
        metadata: Vec<u8>,
    ) -> Result<Self, ChunkError> {
        check_len("blocks", blocks.len(), CHUNK_VOLUME)?;
        check_len("metadata", metadata.len(), CHUNK_VOLUME)?;
        let mut chunk = Self {
            pos,
            blocks: blocks.into_boxed_slice(),
            metadata: metadata.into_boxed_slice(),
            modified: false,
            has_blocks: false,
        };
        chunk.refresh_has_blocks();
        Ok(chunk)
    }

    /// Chunk coordinates.
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Linear cell index for local coordinates.
    ///
    /// Returns `None` if any coordinate is outside the chunk.
    pub fn index(x: usize, y: usize, z: usize) -> Option<usize> {
        if x >= CHUNK_WIDTH || y >= CHUNK_HEIGHT || z >= CHUNK_WIDTH {
            return None;
        }
        Some((y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x)
    }

    /// Voxel colour at `(x, y, z)`, or 0 (air) outside the chunk.
    pub fn get(&self, x: usize, y: usize, z: usize) -> i32 {
        Self::index(x, y, z).map_or(0, |i| self.blocks[i])
    }

    /// Metadata byte at `(x, y, z)`, or 0 outside the chunk.
    pub fn get_meta(&self, x: usize, y: usize, z: usize) -> u8 {
        Self::index(x, y, z).map_or(0, |i| self.metadata[i])
    }

    /// Sets voxel colour and metadata at `(x, y, z)` and marks the chunk modified.
    ///
    /// Out-of-bounds writes are ignored with a warning.
    pub fn set(&mut self, x: usize, y: usize, z: usize, color: i32, meta: u8) {
        let Some(i) = Self::index(x, y, z) else {
            tracing::warn!("Chunk::set out of bounds: ({}, {}, {})", x, y, z);
            return;
        };
        self.blocks[i] = color;
        self.metadata[i] = meta;
        self.modified = true;
        if color != 0 {
            self.has_blocks = true;
        }
    }

    /// Voxel colours in cell-index order.
    pub fn blocks(&self) -> &[i32] {
        &self.blocks
    }

    /// Mutable voxel colours. Callers own the `modified`/`has_blocks` flags
    /// when writing through this.
    pub fn blocks_mut(&mut self) -> &mut [i32] {
        &mut self.blocks
    }

    /// Metadata bytes in cell-index order.
    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Mutable metadata bytes.
    pub fn metadata_mut(&mut self) -> &mut [u8] {
        &mut self.metadata
    }

    /// Both arrays mutably at once, for decoders that fill them in one pass.
    pub fn arrays_mut(&mut self) -> (&mut [i32], &mut [u8]) {
        (&mut self.blocks, &mut self.metadata)
    }

    /// Recomputes `has_blocks` from the voxel array.
    pub fn refresh_has_blocks(&mut self) {
        self.has_blocks = self.blocks.iter().any(|&b| b != 0);
    }

    /// Voxels and metadata of the 16-high section `section_y`.
    pub fn section(&self, section_y: usize) -> Result<(&[i32], &[u8]), CoordError> {
        let range = section_range(section_y)?;
        Ok((&self.blocks[range.clone()], &self.metadata[range]))
    }

    /// Overwrites one section with the given arrays and marks the chunk modified.
    pub fn set_section(
        &mut self,
        section_y: usize,
        blocks: &[i32],
        metadata: &[u8],
    ) -> Result<(), ChunkError> {
        let range = section_range(section_y)?;
        check_len("blocks", blocks.len(), SECTION_VOLUME)?;
        check_len("metadata", metadata.len(), SECTION_VOLUME)?;
        self.blocks[range.clone()].copy_from_slice(blocks);
        self.metadata[range].copy_from_slice(metadata);
        self.modified = true;
        self.refresh_has_blocks();
        Ok(())
    }
}

fn section_range(section_y: usize) -> Result<std::ops::Range<usize>, CoordError> {
    if section_y >= SECTION_COUNT {
        return Err(CoordError::SectionOutOfRange(section_y));
    }
    let start = section_y * SECTION_VOLUME;
    Ok(start..start + SECTION_VOLUME)
}

fn check_len(array: &'static str, actual: usize, expected: usize) -> Result<(), ChunkError> {
    if actual != expected {
        return Err(ChunkError::WrongLength {
            array,
            expected,
            actual,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
