//! Voxel chunk model, chunk/region addressing, and the palette + run-length
//! chunk codec used for on-disk storage.

pub mod chunk;
pub mod codec;
pub mod coords;
pub mod rle;

pub use chunk::{
    CHUNK_HEIGHT, CHUNK_VOLUME, CHUNK_WIDTH, Chunk, ChunkError, SECTION_COUNT, SECTION_HEIGHT,
    SECTION_VOLUME,
};
pub use codec::{compress, decompress};
pub use coords::{ChunkPos, CoordError, REGION_SIZE, REGION_SLOTS, RegionPos};
pub use rle::{MAX_RUN, Run, RunFiller, Runs, runs};
