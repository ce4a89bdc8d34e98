//! Palette + run-length chunk codec used for region-file payloads.
//!
//! ## Binary Layout (big-endian)
//!
//! | Field | Size | Notes |
//! |-------|------|-------|
//! | Palette length `P` | 4 | `u32` |
//! | Palette entries | P×4 | voxel colours in first-seen order, entry 0 is always air |
//! | Voxel runs | 3 each | `count: u8` + `palette index: u16`, until 32768 cells |
//! | Metadata runs | 2 each | `count: u8` + `value: u8`, until 32768 cells |
//!
//! There is no marker between the voxel and metadata streams: the fixed cell
//! count is the only delimiter.

use rustc_hash::FxHashMap;

use crate::chunk::{CHUNK_VOLUME, Chunk};
use crate::coords::ChunkPos;
use crate::rle::{RunFiller, runs};

/// Palette value every chunk starts with.
const AIR: i32 = 0;

/// Insertion-ordered voxel palette.
struct Palette {
    entries: Vec<i32>,
    lookup: FxHashMap<i32, u16>,
}

impl Palette {
    fn new() -> Self {
        let mut palette = Self {
            entries: Vec::new(),
            lookup: FxHashMap::default(),
        };
        palette.index_of(AIR);
        palette
    }

    fn index_of(&mut self, value: i32) -> u16 {
        if let Some(&idx) = self.lookup.get(&value) {
            return idx;
        }
        // A chunk has at most CHUNK_VOLUME + 1 distinct values, which fits in u16.
        let idx = self.entries.len() as u16;
        self.entries.push(value);
        self.lookup.insert(value, idx);
        idx
    }
}

/// Compresses a chunk's voxel and metadata arrays.
pub fn compress(chunk: &Chunk) -> Vec<u8> {
    let mut palette = Palette::new();
    let indices: Vec<u16> = chunk.blocks().iter().map(|&b| palette.index_of(b)).collect();

    let mut buf = Vec::with_capacity(4096);
    buf.extend_from_slice(&(palette.entries.len() as u32).to_be_bytes());
    for value in &palette.entries {
        buf.extend_from_slice(&value.to_be_bytes());
    }

    for run in runs(&indices) {
        buf.push(run.count);
        buf.extend_from_slice(&run.value.to_be_bytes());
    }

    for run in runs(chunk.metadata()) {
        buf.push(run.count);
        buf.push(run.value);
    }

    buf
}

/// Decompresses a payload produced by [`compress`] into a chunk at `pos`.
///
/// Truncated input never fails: decoding stops where the bytes run out and
/// the remaining cells stay zero. Palette indices past the palette decode as air.
/// The result has `has_blocks` derived from the voxels and `modified` clear.
pub fn decompress(data: &[u8], pos: ChunkPos) -> Chunk {
    let mut chunk = Chunk::new(pos);
    let mut cursor = Cursor::new(data);

    let declared = cursor.u32().unwrap_or(0) as usize;
    let palette_len = declared.min(cursor.remaining() / 4);
    if palette_len < declared {
        tracing::debug!(declared, palette_len, "chunk palette truncated");
    }
    let palette: Vec<i32> = (0..palette_len).filter_map(|_| cursor.i32()).collect();

    let (blocks, metadata) = chunk.arrays_mut();

    let mut voxels = RunFiller::new(blocks);
    while !voxels.is_full() {
        let Some((count, index)) = cursor.u8().zip(cursor.u16()) else {
            break;
        };
        let color = palette.get(index as usize).copied().unwrap_or(AIR);
        voxels.push(count, color);
    }
    let voxel_cells = voxels.filled();

    let mut meta = RunFiller::new(metadata);
    while !meta.is_full() {
        let Some((count, value)) = cursor.u8().zip(cursor.u8()) else {
            break;
        };
        meta.push(count, value);
    }

    if voxel_cells < CHUNK_VOLUME || !meta.is_full() {
        tracing::debug!(
            cx = pos.x,
            cz = pos.z,
            voxel_cells,
            meta_cells = meta.filled(),
            "chunk payload truncated"
        );
    }

    chunk.refresh_has_blocks();
    chunk.modified = false;
    chunk
}

/// Big-endian reader that yields `None` once the input is exhausted.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_be_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_be_bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_HEIGHT;

    fn terrain_chunk(distinct: i32) -> Chunk {
        let mut chunk = Chunk::new(ChunkPos::new(-5, 9));
        for y in 0..CHUNK_HEIGHT {
            for z in 0..16 {
                for x in 0..16 {
                    let color = if y < 60 {
                        1 + ((x * 7 + z * 3 + y) as i32 % distinct)
                    } else {
                        0
                    };
                    let meta = ((x ^ z ^ y) % 5) as u8;
                    chunk.set(x, y, z, color, meta);
                }
            }
        }
        chunk
    }

    #[test]
    fn test_roundtrip_preserves_every_cell() {
        for &distinct in &[1, 4, 50, 200] {
            let chunk = terrain_chunk(distinct);
            let bytes = compress(&chunk);
            let restored = decompress(&bytes, chunk.pos());
            assert_eq!(restored.blocks(), chunk.blocks(), "{distinct} colours");
            assert_eq!(restored.metadata(), chunk.metadata(), "{distinct} colours");
            assert!(restored.has_blocks);
            assert!(!restored.modified);
        }
    }

    #[test]
    fn test_empty_chunk_is_small_and_has_no_blocks() {
        let chunk = Chunk::new(ChunkPos::new(0, 0));
        let bytes = compress(&chunk);
        // palette(4 + 4) + 129 voxel runs * 3 + 129 meta runs * 2
        assert_eq!(bytes.len(), 8 + 129 * 3 + 129 * 2);
        let restored = decompress(&bytes, chunk.pos());
        assert!(!restored.has_blocks);
        assert_eq!(restored, chunk);
    }

    #[test]
    fn test_palette_starts_with_air_in_first_seen_order() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.set(0, 0, 0, 77, 0);
        chunk.set(1, 0, 0, -3, 0);
        chunk.set(2, 0, 0, 77, 0);
        let bytes = compress(&chunk);
        assert_eq!(&bytes[0..4], &3u32.to_be_bytes());
        assert_eq!(&bytes[4..8], &0i32.to_be_bytes());
        assert_eq!(&bytes[8..12], &77i32.to_be_bytes());
        assert_eq!(&bytes[12..16], &(-3i32).to_be_bytes());
        // First voxel run: one cell of palette index 1.
        assert_eq!(&bytes[16..19], &[1, 0, 1]);
    }

    #[test]
    fn test_arbitrary_metadata_survives() {
        let mut chunk = Chunk::new(ChunkPos::new(1, 1));
        for (i, m) in chunk.metadata_mut().iter_mut().enumerate() {
            *m = (i * 31 % 251) as u8;
        }
        let restored = decompress(&compress(&chunk), chunk.pos());
        assert_eq!(restored.metadata(), chunk.metadata());
        assert!(!restored.has_blocks);
    }

    #[test]
    fn test_truncated_payload_is_tolerated() {
        let chunk = terrain_chunk(4);
        let bytes = compress(&chunk);
        for cut in [0, 3, 7, 20, bytes.len() / 2, bytes.len() - 1] {
            let restored = decompress(&bytes[..cut], chunk.pos());
            assert_eq!(restored.blocks().len(), CHUNK_VOLUME);
            assert_eq!(restored.metadata().len(), CHUNK_VOLUME);
        }
        let partial = decompress(&bytes[..bytes.len() - 1], chunk.pos());
        assert_eq!(partial.blocks(), chunk.blocks());
        assert_eq!(partial.metadata()[CHUNK_VOLUME - 1], 0);
    }

    #[test]
    fn test_out_of_range_palette_index_decodes_as_air() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(&0i32.to_be_bytes());
        bytes.extend_from_slice(&[10, 0, 9]);
        let chunk = decompress(&bytes, ChunkPos::new(0, 0));
        assert!(!chunk.has_blocks);
    }

    #[test]
    fn test_oversized_palette_length_does_not_allocate_wildly() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_be_bytes());
        bytes.extend_from_slice(&5i32.to_be_bytes());
        let chunk = decompress(&bytes, ChunkPos::new(0, 0));
        assert!(!chunk.has_blocks);
    }
}
