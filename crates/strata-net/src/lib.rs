//! Binary wire protocol: one frame per message, a leading kind byte, then a
//! fixed big-endian payload per kind.

pub mod angles;
pub mod buffer;
pub mod channel;
mod chunk_rle;
pub mod codec;
mod error;
pub mod messages;

pub use buffer::{FrameReader, FrameWriter};
pub use channel::{ChannelError, LoopbackChannel, MessageChannel, receive, send};
pub use chunk_rle::{
    CHUNK_FRAME_BUDGET, CHUNK_FRAME_CAPACITY, SECTION_FRAME_CAPACITY, SECTION_META_BUDGET,
    SECTION_VOXEL_BUDGET,
};
pub use codec::{EncodedFrame, WireMessage, decode, encode, peek_kind};
pub use error::ProtocolError;
pub use messages::{
    BlockSet, ChunkRequest, ChunkSection, EntityDestroy, EntityMove, ItemEntity, ItemStack,
    Message, PacketKind, PlayerDimension, PlayerList, PlayerPosition, RemotePlayer, WorldSync,
};
