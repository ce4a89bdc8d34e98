//! Frame-level encode and decode.
//!
//! [`encode`] and [`decode`] dispatch on [`Message`]; each payload type also
//! implements [`WireMessage`] so callers that know the kind can skip the enum.

use crate::buffer::{FrameReader, FrameWriter};
use crate::error::ProtocolError;
use crate::messages::{ItemStack, Message, PacketKind};

/// One encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Kind byte followed by the payload.
    pub bytes: Vec<u8>,
    /// True if a byte budget cut the payload short. The frame still decodes;
    /// the cells or entries it could not hold come back as defaults.
    pub partial: bool,
}

impl From<FrameWriter> for EncodedFrame {
    fn from(w: FrameWriter) -> Self {
        let (bytes, partial) = w.finish();
        Self { bytes, partial }
    }
}

/// A payload with a fixed kind byte and layout.
pub trait WireMessage: Sized {
    /// Kind byte the payload is framed with.
    const KIND: PacketKind;

    /// Initial buffer size for an encoded frame.
    const CAPACITY: usize;

    /// Appends the payload after the kind byte.
    fn write_payload(&self, w: &mut FrameWriter);

    /// Reads the payload; the kind byte has already been consumed.
    fn read_payload(r: &mut FrameReader<'_>) -> Result<Self, ProtocolError>;

    /// Encodes a whole frame.
    fn encode(&self) -> EncodedFrame {
        let mut w = FrameWriter::new(Self::KIND, Self::CAPACITY);
        self.write_payload(&mut w);
        w.into()
    }

    /// Decodes a whole frame, rejecting frames of any other kind.
    fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let found = peek_kind(frame)?;
        if found != Self::KIND {
            return Err(ProtocolError::UnexpectedKind {
                expected: Self::KIND,
                found,
            });
        }
        Self::read_payload(&mut FrameReader::new(&frame[1..]))
    }
}

/// Reads the kind byte without decoding the payload.
pub fn peek_kind(frame: &[u8]) -> Result<PacketKind, ProtocolError> {
    let &byte = frame.first().ok_or(ProtocolError::EmptyFrame)?;
    PacketKind::try_from(byte)
}

/// Encodes `msg` into one frame.
pub fn encode(msg: &Message) -> EncodedFrame {
    let frame = match msg {
        Message::PlayerPosition(m) => m.encode(),
        Message::BlockSet(m) => m.encode(),
        Message::ChunkData(m) => m.encode(),
        Message::WorldSync(m) => m.encode(),
        Message::ChunkRequest(m) => m.encode(),
        Message::PlayerList(m) => m.encode(),
        Message::KeepAlive => signal(PacketKind::KeepAlive),
        Message::Disconnect => signal(PacketKind::Disconnect),
        Message::ChunkSection(m) => m.encode(),
        Message::PlayerDimension(m) => m.encode(),
        Message::EntitySpawn(m) => m.encode(),
        Message::EntityMove(m) => m.encode(),
        Message::EntityDestroy(m) => m.encode(),
        Message::DropItemRequest(m) => item_frame(PacketKind::DropItemRequest, m),
        Message::AddItem(m) => item_frame(PacketKind::AddItem, m),
    };
    if frame.partial {
        tracing::debug!(
            kind = ?msg.kind(),
            len = frame.bytes.len(),
            "encoded partial frame"
        );
    }
    frame
}

/// Decodes one frame.
///
/// Bytes after the last field this build knows are ignored, so newer peers
/// can append fields.
pub fn decode(frame: &[u8]) -> Result<Message, ProtocolError> {
    let kind = peek_kind(frame)?;
    let r = &mut FrameReader::new(&frame[1..]);
    Ok(match kind {
        PacketKind::PlayerPos => Message::PlayerPosition(WireMessage::read_payload(r)?),
        PacketKind::BlockSet => Message::BlockSet(WireMessage::read_payload(r)?),
        PacketKind::ChunkData => Message::ChunkData(WireMessage::read_payload(r)?),
        PacketKind::WorldData => Message::WorldSync(WireMessage::read_payload(r)?),
        PacketKind::ChunkRequest => Message::ChunkRequest(WireMessage::read_payload(r)?),
        PacketKind::PlayerList => Message::PlayerList(WireMessage::read_payload(r)?),
        PacketKind::KeepAlive => Message::KeepAlive,
        PacketKind::Disconnect => Message::Disconnect,
        PacketKind::ChunkSection => Message::ChunkSection(WireMessage::read_payload(r)?),
        PacketKind::PlayerDimension => Message::PlayerDimension(WireMessage::read_payload(r)?),
        PacketKind::EntitySpawn => Message::EntitySpawn(WireMessage::read_payload(r)?),
        PacketKind::EntityMove => Message::EntityMove(WireMessage::read_payload(r)?),
        PacketKind::EntityDestroy => Message::EntityDestroy(WireMessage::read_payload(r)?),
        PacketKind::DropItemRequest => Message::DropItemRequest(ItemStack::read_payload(r)?),
        PacketKind::AddItem => Message::AddItem(ItemStack::read_payload(r)?),
    })
}

fn signal(kind: PacketKind) -> EncodedFrame {
    FrameWriter::new(kind, 1).into()
}

fn item_frame(kind: PacketKind, stack: &ItemStack) -> EncodedFrame {
    let mut w = FrameWriter::new(kind, ItemStack::FRAME_LEN);
    stack.write_payload(&mut w);
    w.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
