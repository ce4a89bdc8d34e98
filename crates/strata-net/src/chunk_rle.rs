//! Run-length streams for chunk frames, written under a hard byte budget.
//!
//! Voxel runs are `count: u8` + `color: i32` (5 bytes); metadata runs are
//! `count: u8` + `value: u8` (2 bytes). Before each run the writer checks the
//! frame length against the budget and stops once it is exceeded, marking the
//! frame partial. Only pathological high-entropy chunks ever reach it.

use strata_voxel::{RunFiller, runs};

use crate::buffer::{FrameReader, FrameWriter};

/// Pre-sized capacity of a full-chunk frame.
pub const CHUNK_FRAME_CAPACITY: usize = 131_072;

/// Frame length after which full-chunk run encoding stops.
pub const CHUNK_FRAME_BUDGET: usize = 130_000;

/// Pre-sized capacity of a chunk-section frame.
pub const SECTION_FRAME_CAPACITY: usize = 65_536;

/// Frame length after which section voxel runs stop.
pub const SECTION_VOXEL_BUDGET: usize = 60_000;

/// Frame length after which section metadata runs stop.
pub const SECTION_META_BUDGET: usize = 65_000;

const COLOR_RUN_BYTES: usize = 5;
const META_RUN_BYTES: usize = 2;

/// Writes voxel colour runs until done or over `budget`. Returns cells written.
pub(crate) fn write_color_runs(w: &mut FrameWriter, cells: &[i32], budget: usize) -> usize {
    let mut written = 0;
    for run in runs(cells) {
        if w.len() > budget {
            w.mark_partial();
            break;
        }
        w.put_u8(run.count);
        w.put_i32(run.value);
        written += run.count as usize;
    }
    written
}

/// Writes metadata runs until done or over `budget`. Returns cells written.
pub(crate) fn write_meta_runs(w: &mut FrameWriter, cells: &[u8], budget: usize) -> usize {
    let mut written = 0;
    for run in runs(cells) {
        if w.len() > budget {
            w.mark_partial();
            break;
        }
        w.put_u8(run.count);
        w.put_u8(run.value);
        written += run.count as usize;
    }
    written
}

/// Fills `cells` from voxel runs, stopping quietly when less than a whole run remains.
pub(crate) fn read_color_runs(
    r: &mut FrameReader<'_>,
    cells: &mut [i32],
) -> Result<usize, crate::ProtocolError> {
    let mut filler = RunFiller::new(cells);
    while !filler.is_full() && r.remaining() >= COLOR_RUN_BYTES {
        let count = r.get_u8("run count")?;
        let color = r.get_i32("run color")?;
        filler.push(count, color);
    }
    Ok(filler.filled())
}

/// Fills `cells` from metadata runs, stopping quietly when less than a whole run remains.
pub(crate) fn read_meta_runs(
    r: &mut FrameReader<'_>,
    cells: &mut [u8],
) -> Result<usize, crate::ProtocolError> {
    let mut filler = RunFiller::new(cells);
    while !filler.is_full() && r.remaining() >= META_RUN_BYTES {
        let count = r.get_u8("run count")?;
        let value = r.get_u8("run meta")?;
        filler.push(count, value);
    }
    Ok(filler.filled())
}
