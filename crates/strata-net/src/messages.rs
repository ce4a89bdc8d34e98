//! Wire message types.
//!
//! Every frame starts with a [`PacketKind`] byte. The payload layouts live in
//! the [`WireMessage`](crate::WireMessage) impls at the bottom of this file.

use std::borrow::Cow;

use strata_voxel::{
    Chunk, ChunkError, ChunkPos, CoordError, SECTION_COUNT, SECTION_VOLUME,
};

use crate::angles::{pack_pitch, pack_yaw, unpack_pitch, unpack_yaw};
use crate::buffer::{FrameReader, FrameWriter};
use crate::chunk_rle::{
    CHUNK_FRAME_BUDGET, CHUNK_FRAME_CAPACITY, SECTION_FRAME_CAPACITY, SECTION_META_BUDGET,
    SECTION_VOXEL_BUDGET, read_color_runs, read_meta_runs, write_color_runs, write_meta_runs,
};
use crate::codec::WireMessage;
use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// PacketKind
// ---------------------------------------------------------------------------

/// Leading byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    /// [`PlayerPosition`].
    PlayerPos = 0x01,
    /// [`BlockSet`].
    BlockSet = 0x02,
    /// Full [`Chunk`].
    ChunkData = 0x03,
    /// [`WorldSync`].
    WorldData = 0x04,
    /// [`ChunkRequest`].
    ChunkRequest = 0x05,
    /// [`PlayerList`].
    PlayerList = 0x06,
    /// Empty heartbeat.
    KeepAlive = 0x07,
    /// Empty goodbye.
    Disconnect = 0x08,
    /// [`ChunkSection`].
    ChunkSection = 0x09,
    /// [`PlayerDimension`].
    PlayerDimension = 0x0A,
    /// [`ItemEntity`] appearing.
    EntitySpawn = 0x0B,
    /// [`EntityMove`].
    EntityMove = 0x0C,
    /// [`EntityDestroy`].
    EntityDestroy = 0x0D,
    /// Client asks to drop an [`ItemStack`].
    DropItemRequest = 0x0E,
    /// Server grants an [`ItemStack`].
    AddItem = 0x0F,
}

impl TryFrom<u8> for PacketKind {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, ProtocolError> {
        Ok(match byte {
            0x01 => Self::PlayerPos,
            0x02 => Self::BlockSet,
            0x03 => Self::ChunkData,
            0x04 => Self::WorldData,
            0x05 => Self::ChunkRequest,
            0x06 => Self::PlayerList,
            0x07 => Self::KeepAlive,
            0x08 => Self::Disconnect,
            0x09 => Self::ChunkSection,
            0x0A => Self::PlayerDimension,
            0x0B => Self::EntitySpawn,
            0x0C => Self::EntityMove,
            0x0D => Self::EntityDestroy,
            0x0E => Self::DropItemRequest,
            0x0F => Self::AddItem,
            other => return Err(ProtocolError::UnknownKind(other)),
        })
    }
}

// ---------------------------------------------------------------------------
// Top-level enum
// ---------------------------------------------------------------------------

/// Any message that can travel in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A player's position and view direction.
    PlayerPosition(PlayerPosition),
    /// A single voxel edit.
    BlockSet(BlockSet),
    /// A whole chunk snapshot.
    ChunkData(Chunk),
    /// World clock and session state for a joining client.
    WorldSync(WorldSync),
    /// Client asks for a chunk.
    ChunkRequest(ChunkRequest),
    /// Every connected player.
    PlayerList(PlayerList),
    /// Heartbeat.
    KeepAlive,
    /// Orderly disconnect.
    Disconnect,
    /// One 16-high slice of a chunk.
    ChunkSection(ChunkSection),
    /// A player moved to another dimension.
    PlayerDimension(PlayerDimension),
    /// A dropped item appeared.
    EntitySpawn(ItemEntity),
    /// A dropped item moved.
    EntityMove(EntityMove),
    /// A dropped item vanished.
    EntityDestroy(EntityDestroy),
    /// Client drops items from its inventory.
    DropItemRequest(ItemStack),
    /// Server adds items to a client's inventory.
    AddItem(ItemStack),
}

impl Message {
    /// Kind byte this message is framed with.
    pub fn kind(&self) -> PacketKind {
        match self {
            Message::PlayerPosition(_) => PacketKind::PlayerPos,
            Message::BlockSet(_) => PacketKind::BlockSet,
            Message::ChunkData(_) => PacketKind::ChunkData,
            Message::WorldSync(_) => PacketKind::WorldData,
            Message::ChunkRequest(_) => PacketKind::ChunkRequest,
            Message::PlayerList(_) => PacketKind::PlayerList,
            Message::KeepAlive => PacketKind::KeepAlive,
            Message::Disconnect => PacketKind::Disconnect,
            Message::ChunkSection(_) => PacketKind::ChunkSection,
            Message::PlayerDimension(_) => PacketKind::PlayerDimension,
            Message::EntitySpawn(_) => PacketKind::EntitySpawn,
            Message::EntityMove(_) => PacketKind::EntityMove,
            Message::EntityDestroy(_) => PacketKind::EntityDestroy,
            Message::DropItemRequest(_) => PacketKind::DropItemRequest,
            Message::AddItem(_) => PacketKind::AddItem,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// Player position. Coordinates travel as `f32`, angles as one byte each.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPosition {
    /// Sending player.
    pub player_id: u8,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Radians; quantized on the wire.
    pub yaw: f64,
    /// Radians in `[-π/2, π/2]`; quantized on the wire.
    pub pitch: f64,
}

/// A single voxel edit in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSet {
    pub x: i32,
    /// Height inside the chunk column, `0..128`.
    pub y: u8,
    pub z: i32,
    /// New voxel colour; 0 removes the block.
    pub color: i32,
    /// New metadata byte. Older peers omit it; it then reads as 0.
    pub meta: u8,
}

/// Request for the chunk at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRequest {
    pub pos: ChunkPos,
}

/// One 16×16×16 section of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    pub pos: ChunkPos,
    /// Section index, `0..8` for a valid section.
    pub section_y: u8,
    /// [`SECTION_VOLUME`] voxel colours. Encoding truncates or zero-pads
    /// any other length and marks the frame partial.
    pub blocks: Vec<i32>,
    /// [`SECTION_VOLUME`] metadata bytes, same rule as `blocks`.
    pub metadata: Vec<u8>,
}

impl ChunkSection {
    /// Copies section `section_y` out of `chunk`.
    pub fn from_chunk(chunk: &Chunk, section_y: u8) -> Result<Self, CoordError> {
        let (blocks, metadata) = chunk.section(usize::from(section_y))?;
        Ok(Self {
            pos: chunk.pos(),
            section_y,
            blocks: blocks.to_vec(),
            metadata: metadata.to_vec(),
        })
    }

    /// Writes this section into `chunk`, marking it modified.
    pub fn apply_to(&self, chunk: &mut Chunk) -> Result<(), ChunkError> {
        chunk.set_section(usize::from(self.section_y), &self.blocks, &self.metadata)
    }

    /// True if `section_y` addresses a section inside a chunk.
    pub fn in_range(&self) -> bool {
        usize::from(self.section_y) < SECTION_COUNT
    }
}

/// World state sent to a client when it joins, and periodically after.
///
/// The trailing fields were added over time; a peer that omits them is
/// decoded with the defaults documented on each field.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSync {
    pub seed: i32,
    /// Hours into the current day.
    pub game_time: f64,
    pub day_counter: i32,
    /// Id assigned to the receiving player; 0 when absent.
    pub player_id: u8,
    /// Host has paused the clock; false when absent.
    pub frozen: bool,
    /// Dimension the receiving player is in.
    pub dimension: Option<String>,
    /// Colours the world generator treats as ore.
    pub ore_colors: Option<Vec<i32>>,
}

/// Another player as seen in a [`PlayerList`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub id: u8,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f64,
    pub pitch: f64,
    pub dimension: String,
}

/// Every connected player. At most 255 entries fit in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerList {
    pub players: Vec<RemotePlayer>,
}

/// A player changed dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDimension {
    pub player_id: u8,
    pub dimension: String,
}

/// A dropped item stack in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntity {
    pub id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub color: i32,
    pub count: i32,
    pub dimension: String,
}

/// Movement of a dropped item. `count` is sent when the stack size changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMove {
    pub id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub count: Option<i32>,
}

/// A dropped item was picked up or despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroy {
    pub id: i32,
}

/// `count` items of colour `color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStack {
    pub color: i32,
    pub count: i32,
}

impl ItemStack {
    pub(crate) const FRAME_LEN: usize = 9;

    pub(crate) fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.color);
        w.put_i32(self.count);
    }

    pub(crate) fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            color: r.get_i32("item color")?,
            count: r.get_i32("item count")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Payload layouts
// ---------------------------------------------------------------------------

impl WireMessage for PlayerPosition {
    const KIND: PacketKind = PacketKind::PlayerPos;
    const CAPACITY: usize = 16;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_u8(self.player_id);
        w.put_f32(self.x);
        w.put_f32(self.y);
        w.put_f32(self.z);
        w.put_u8(pack_yaw(self.yaw));
        w.put_u8(pack_pitch(self.pitch));
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            player_id: r.get_u8("player id")?,
            x: r.get_f32("x")?,
            y: r.get_f32("y")?,
            z: r.get_f32("z")?,
            yaw: unpack_yaw(r.get_u8("yaw")?),
            pitch: unpack_pitch(r.get_u8("pitch")?),
        })
    }
}

impl WireMessage for BlockSet {
    const KIND: PacketKind = PacketKind::BlockSet;
    const CAPACITY: usize = 15;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.x);
        w.put_i32(self.z);
        w.put_u8(self.y);
        w.put_i32(self.color);
        w.put_u8(self.meta);
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let x = r.get_i32("x")?;
        let z = r.get_i32("z")?;
        let y = r.get_u8("y")?;
        let color = r.get_i32("color")?;
        let meta = r.optional(|r| r.get_u8("meta"))?.unwrap_or(0);
        Ok(Self {
            x,
            y,
            z,
            color,
            meta,
        })
    }
}

impl WireMessage for Chunk {
    const KIND: PacketKind = PacketKind::ChunkData;
    const CAPACITY: usize = CHUNK_FRAME_CAPACITY;

    fn write_payload(&self, w: &mut FrameWriter) {
        let pos = self.pos();
        w.put_i32(pos.x);
        w.put_i32(pos.z);
        let voxels = write_color_runs(w, self.blocks(), CHUNK_FRAME_BUDGET);
        let metas = write_meta_runs(w, self.metadata(), CHUNK_FRAME_BUDGET);
        if w.is_partial() {
            tracing::warn!(
                cx = pos.x,
                cz = pos.z,
                voxels,
                metas,
                "chunk frame hit byte budget, trailing cells dropped"
            );
        }
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let cx = r.get_i32("cx")?;
        let cz = r.get_i32("cz")?;
        let mut chunk = Chunk::new(ChunkPos::new(cx, cz));
        let (blocks, metadata) = chunk.arrays_mut();
        read_color_runs(r, blocks)?;
        read_meta_runs(r, metadata)?;
        chunk.refresh_has_blocks();
        Ok(chunk)
    }
}

impl WireMessage for WorldSync {
    const KIND: PacketKind = PacketKind::WorldData;
    const CAPACITY: usize = 64;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.seed);
        w.put_f64(self.game_time);
        w.put_i32(self.day_counter);
        w.put_u8(self.player_id);
        w.put_bool(self.frozen);
        let Some(dimension) = &self.dimension else {
            return;
        };
        w.put_str(dimension);
        let Some(colors) = &self.ore_colors else {
            return;
        };
        w.put_i32(colors.len() as i32);
        for &color in colors {
            w.put_i32(color);
        }
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let seed = r.get_i32("seed")?;
        let game_time = r.get_f64("game time")?;
        let day_counter = r.get_i32("day counter")?;
        let player_id = r.optional(|r| r.get_u8("player id"))?.unwrap_or(0);
        let frozen = r.optional(|r| r.get_bool("frozen"))?.unwrap_or(false);
        let dimension = r.optional(|r| r.get_str("dimension"))?;
        let ore_colors = r.optional(read_ore_colors)?;
        Ok(Self {
            seed,
            game_time,
            day_counter,
            player_id,
            frozen,
            dimension,
            ore_colors,
        })
    }
}

fn read_ore_colors(r: &mut FrameReader<'_>) -> Result<Vec<i32>, ProtocolError> {
    const FIELD: &str = "ore colors";
    let len = r.get_i32(FIELD)?;
    let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength { field: FIELD, len })?;
    // Check up front so a bogus count cannot drive a huge allocation.
    let needed = len.saturating_mul(4);
    if r.remaining() < needed {
        return Err(ProtocolError::Underflow {
            field: FIELD,
            needed,
            remaining: r.remaining(),
        });
    }
    (0..len).map(|_| r.get_i32(FIELD)).collect()
}

impl WireMessage for ChunkRequest {
    const KIND: PacketKind = PacketKind::ChunkRequest;
    const CAPACITY: usize = 9;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.pos.x);
        w.put_i32(self.pos.z);
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let cx = r.get_i32("cx")?;
        let cz = r.get_i32("cz")?;
        Ok(Self {
            pos: ChunkPos::new(cx, cz),
        })
    }
}

impl WireMessage for PlayerList {
    const KIND: PacketKind = PacketKind::PlayerList;
    const CAPACITY: usize = 256;

    fn write_payload(&self, w: &mut FrameWriter) {
        let count = self.players.len().min(usize::from(u8::MAX));
        if count < self.players.len() {
            w.mark_partial();
            tracing::warn!(
                players = self.players.len(),
                "player list truncated to {} entries",
                count
            );
        }
        w.put_u8(count as u8);
        for p in &self.players[..count] {
            w.put_u8(p.id);
            w.put_f32(p.x);
            w.put_f32(p.y);
            w.put_f32(p.z);
            w.put_u8(pack_yaw(p.yaw));
            w.put_u8(pack_pitch(p.pitch));
            w.put_str(&p.dimension);
        }
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let count = r.get_u8("player count")?;
        let mut players = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            players.push(RemotePlayer {
                id: r.get_u8("player id")?,
                x: r.get_f32("x")?,
                y: r.get_f32("y")?,
                z: r.get_f32("z")?,
                yaw: unpack_yaw(r.get_u8("yaw")?),
                pitch: unpack_pitch(r.get_u8("pitch")?),
                dimension: r.get_str("dimension")?,
            });
        }
        Ok(Self { players })
    }
}

impl WireMessage for ChunkSection {
    const KIND: PacketKind = PacketKind::ChunkSection;
    const CAPACITY: usize = SECTION_FRAME_CAPACITY;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.pos.x);
        w.put_i32(self.pos.z);
        w.put_u8(self.section_y);
        if self.blocks.len() != SECTION_VOLUME || self.metadata.len() != SECTION_VOLUME {
            w.mark_partial();
            tracing::warn!(
                blocks = self.blocks.len(),
                metadata = self.metadata.len(),
                "section arrays are not {} cells, resized for the wire",
                SECTION_VOLUME
            );
        }
        let voxels = write_color_runs(w, &section_cells(&self.blocks), SECTION_VOXEL_BUDGET);
        let metas = write_meta_runs(w, &section_cells(&self.metadata), SECTION_META_BUDGET);
        if w.is_partial() {
            tracing::warn!(
                cx = self.pos.x,
                cz = self.pos.z,
                section_y = self.section_y,
                voxels,
                metas,
                "section frame hit byte budget, trailing cells dropped"
            );
        }
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        let cx = r.get_i32("cx")?;
        let cz = r.get_i32("cz")?;
        let section_y = r.get_u8("section y")?;
        let mut blocks = vec![0; SECTION_VOLUME];
        let mut metadata = vec![0; SECTION_VOLUME];
        read_color_runs(r, &mut blocks)?;
        read_meta_runs(r, &mut metadata)?;
        Ok(Self {
            pos: ChunkPos::new(cx, cz),
            section_y,
            blocks,
            metadata,
        })
    }
}

/// `cells` cut or zero-padded to exactly [`SECTION_VOLUME`], so the voxel
/// stream never runs into the metadata stream on decode.
fn section_cells<T: Copy + Default>(cells: &[T]) -> Cow<'_, [T]> {
    if cells.len() == SECTION_VOLUME {
        return Cow::Borrowed(cells);
    }
    let mut fixed = vec![T::default(); SECTION_VOLUME];
    let n = cells.len().min(SECTION_VOLUME);
    fixed[..n].copy_from_slice(&cells[..n]);
    Cow::Owned(fixed)
}

impl WireMessage for PlayerDimension {
    const KIND: PacketKind = PacketKind::PlayerDimension;
    const CAPACITY: usize = 32;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_u8(self.player_id);
        w.put_str(&self.dimension);
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            player_id: r.get_u8("player id")?,
            dimension: r.get_str("dimension")?,
        })
    }
}

impl WireMessage for ItemEntity {
    const KIND: PacketKind = PacketKind::EntitySpawn;
    const CAPACITY: usize = 80;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.id);
        for v in [self.x, self.y, self.z, self.vx, self.vy, self.vz] {
            w.put_f64(v);
        }
        w.put_i32(self.color);
        w.put_i32(self.count);
        w.put_str(&self.dimension);
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: r.get_i32("entity id")?,
            x: r.get_f64("x")?,
            y: r.get_f64("y")?,
            z: r.get_f64("z")?,
            vx: r.get_f64("vx")?,
            vy: r.get_f64("vy")?,
            vz: r.get_f64("vz")?,
            color: r.get_i32("item color")?,
            count: r.get_i32("item count")?,
            dimension: r.get_str("dimension")?,
        })
    }
}

impl WireMessage for EntityMove {
    const KIND: PacketKind = PacketKind::EntityMove;
    const CAPACITY: usize = 57;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.id);
        for v in [self.x, self.y, self.z, self.vx, self.vy, self.vz] {
            w.put_f64(v);
        }
        if let Some(count) = self.count {
            w.put_i32(count);
        }
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: r.get_i32("entity id")?,
            x: r.get_f64("x")?,
            y: r.get_f64("y")?,
            z: r.get_f64("z")?,
            vx: r.get_f64("vx")?,
            vy: r.get_f64("vy")?,
            vz: r.get_f64("vz")?,
            count: r.optional(|r| r.get_i32("item count"))?,
        })
    }
}

impl WireMessage for EntityDestroy {
    const KIND: PacketKind = PacketKind::EntityDestroy;
    const CAPACITY: usize = 5;

    fn write_payload(&self, w: &mut FrameWriter) {
        w.put_i32(self.id);
    }

    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            id: r.get_i32("entity id")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
