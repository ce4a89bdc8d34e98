//! Durable world storage: region files holding compressed chunks, and the
//! tagged `world.dat` record of per-world state.

mod error;
mod locks;
pub mod region;
pub mod world_data;
mod world_dir;

pub use error::StorageError;
pub use locks::RegionLocks;
pub use region::{HEADER_BYTES, RegionFileStore, SlotEntry};
pub use world_data::{FieldValue, TaggedField, WorldData, WorldMetadataStore};
pub use world_dir::{DEFAULT_DIMENSION, WorldDirectory, list_worlds, saves_dir};
