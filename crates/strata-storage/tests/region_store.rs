//! End-to-end region storage: persistence across store instances, slot
//! relocation, and concurrent writers sharing one region file.

use std::sync::Arc;
use std::thread;

use strata_storage::{
    DEFAULT_DIMENSION, HEADER_BYTES, RegionFileStore, RegionLocks, WorldData, WorldDirectory,
    WorldMetadataStore, list_worlds,
};
use strata_voxel::{Chunk, ChunkPos, RegionPos};

fn chunk_with_layers(pos: ChunkPos, layers: usize, salt: i32) -> Chunk {
    let mut chunk = Chunk::new(pos);
    for y in 0..layers {
        for z in 0..16 {
            for x in 0..16 {
                let color = salt + (x * 13 + z * 7 + y * 3) as i32;
                chunk.set(x, y, z, color, ((x + z) % 3) as u8);
            }
        }
    }
    chunk
}

#[test]
fn test_saved_chunk_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let pos = ChunkPos::new(-33, 31);
    let chunk = chunk_with_layers(pos, 8, 100);

    {
        let world = WorldDirectory::open(dir.path(), "persist").unwrap();
        RegionFileStore::new(world).save(&chunk, DEFAULT_DIMENSION).unwrap();
    }

    let world = WorldDirectory::open(dir.path(), "persist").unwrap();
    let loaded = RegionFileStore::new(world)
        .load(pos, DEFAULT_DIMENSION)
        .unwrap()
        .expect("chunk should be present");
    assert_eq!(loaded.pos(), pos);
    assert_eq!(loaded.blocks(), chunk.blocks());
    assert_eq!(loaded.metadata(), chunk.metadata());
    assert!(loaded.has_blocks);
    assert!(!loaded.modified);
}

#[test]
fn test_larger_payload_moves_to_end_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegionFileStore::new(WorldDirectory::open(dir.path(), "grow").unwrap());
    let region = RegionPos::new(0, 0);

    let a = ChunkPos::new(0, 0);
    let b = ChunkPos::new(1, 0);
    let c = ChunkPos::new(5, 9);
    store.save(&chunk_with_layers(a, 1, 0), DEFAULT_DIMENSION).unwrap();
    store.save(&chunk_with_layers(b, 1, 0), DEFAULT_DIMENSION).unwrap();
    store.save(&chunk_with_layers(c, 1, 0), DEFAULT_DIMENSION).unwrap();

    let before = store.slot_table(region, DEFAULT_DIMENSION).unwrap().unwrap();
    let path = store.region_path(DEFAULT_DIMENSION, region).unwrap();
    let len_before = std::fs::metadata(&path).unwrap().len();

    let bigger = chunk_with_layers(b, 30, 0);
    store.save(&bigger, DEFAULT_DIMENSION).unwrap();

    let after = store.slot_table(region, DEFAULT_DIMENSION).unwrap().unwrap();
    assert_eq!(u64::from(after[b.slot_index()].offset), len_before);
    assert!(after[b.slot_index()].length > before[b.slot_index()].length);
    for slot in 0..after.len() {
        if slot != b.slot_index() {
            assert_eq!(after[slot], before[slot], "slot {slot} changed");
        }
    }
    assert!(u64::from(before[a.slot_index()].offset) >= HEADER_BYTES);

    let loaded = store.load(b, DEFAULT_DIMENSION).unwrap().unwrap();
    assert_eq!(loaded.blocks(), bigger.blocks());
    let untouched = store.load(c, DEFAULT_DIMENSION).unwrap().unwrap();
    assert_eq!(untouched.blocks(), chunk_with_layers(c, 1, 0).blocks());
}

#[test]
fn test_unsaved_slot_in_existing_region_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = RegionFileStore::new(WorldDirectory::open(dir.path(), "sparse").unwrap());
    store
        .save(&chunk_with_layers(ChunkPos::new(3, 3), 1, 1), DEFAULT_DIMENSION)
        .unwrap();
    assert!(
        store
            .load(ChunkPos::new(4, 3), DEFAULT_DIMENSION)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_concurrent_saves_into_one_region() {
    let dir = tempfile::tempdir().unwrap();
    let world = WorldDirectory::open(dir.path(), "busy").unwrap();
    let locks = RegionLocks::new();
    let store = Arc::new(RegionFileStore::with_locks(world, locks.clone()));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..4 {
                    for i in 0..4 {
                        let pos = ChunkPos::new(t * 4 + i, -1);
                        let chunk = chunk_with_layers(pos, 1 + round * 3, t);
                        store.save(&chunk, DEFAULT_DIMENSION).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..8 {
        for i in 0..4 {
            let pos = ChunkPos::new(t * 4 + i, -1);
            let loaded = store.load(pos, DEFAULT_DIMENSION).unwrap().unwrap();
            assert_eq!(
                loaded.blocks(),
                chunk_with_layers(pos, 10, t).blocks(),
                "chunk {pos:?} corrupted"
            );
        }
    }
    assert!(locks.is_empty(), "idle region locks were not released");
}

#[test]
fn test_world_listing_and_metadata_together() {
    let dir = tempfile::tempdir().unwrap();
    let world = WorldDirectory::open(dir.path(), "alpha").unwrap();
    let meta = WorldMetadataStore::new(&world);
    let data = WorldData {
        day_counter: 3,
        ..WorldData::new(42, [0.0, 64.0, 0.0, 0.0, 0.0])
    };
    meta.save(&data).unwrap();

    assert_eq!(list_worlds(dir.path()).unwrap(), vec!["alpha"]);
    let reopened = WorldMetadataStore::new(&WorldDirectory::open(dir.path(), "alpha").unwrap());
    assert_eq!(reopened.load().unwrap(), Some(data));
}
