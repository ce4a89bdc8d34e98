//! Chunk and region addressing.
//!
//! Region coordinates are the floor-division of chunk coordinates by
//! [`REGION_SIZE`]; a chunk's slot inside its region uses the Euclidean
//! remainder so negative coordinates map into `[0, REGION_SIZE)`.

use crate::chunk::CHUNK_WIDTH;

/// Chunks per region side.
pub const REGION_SIZE: i32 = 32;

/// Slots in one region file (32 × 32).
pub const REGION_SLOTS: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Coordinate errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordError {
    /// A section index was not in `0..SECTION_COUNT`.
    #[error("section index {0} out of range")]
    SectionOutOfRange(usize),
}

/// Integer chunk-grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkPos {
    /// Chunk-grid X.
    pub x: i32,
    /// Chunk-grid Z.
    pub z: i32,
}

impl ChunkPos {
    /// Creates a chunk position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the world block column `(block_x, block_z)`.
    pub fn containing_block(block_x: i32, block_z: i32) -> Self {
        let w = CHUNK_WIDTH as i32;
        Self::new(block_x.div_euclid(w), block_z.div_euclid(w))
    }

    /// Region that stores this chunk.
    pub fn region(self) -> RegionPos {
        RegionPos {
            x: self.x.div_euclid(REGION_SIZE),
            z: self.z.div_euclid(REGION_SIZE),
        }
    }

    /// Chunk offset inside its region, each component in `[0, 32)`.
    pub fn local(self) -> (usize, usize) {
        (
            self.x.rem_euclid(REGION_SIZE) as usize,
            self.z.rem_euclid(REGION_SIZE) as usize,
        )
    }

    /// Slot index in the region header: `local_x + 32 * local_z`.
    pub fn slot_index(self) -> usize {
        let (lx, lz) = self.local();
        lx + REGION_SIZE as usize * lz
    }
}

/// Region-grid position (one region file per position and dimension).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RegionPos {
    /// Region-grid X.
    pub x: i32,
    /// Region-grid Z.
    pub z: i32,
}

impl RegionPos {
    /// Creates a region position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// File name of this region, e.g. `r_-1_0.rgn`.
    pub fn file_name(self) -> String {
        format!("r_{}_{}.rgn", self.x, self.z)
    }

    /// Chunk stored in `slot` of this region.
    pub fn chunk_at_slot(self, slot: usize) -> ChunkPos {
        let size = REGION_SIZE as usize;
        ChunkPos::new(
            self.x * REGION_SIZE + (slot % size) as i32,
            self.z * REGION_SIZE + (slot / size) as i32,
        )
    }
}
