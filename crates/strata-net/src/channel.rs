//! The transport seam: an opaque channel carrying whole frames.
//!
//! Session setup, framing on the socket and reconnection belong to the
//! transport that implements [`MessageChannel`]. This module only turns
//! [`Message`]s into frames and back, and surfaces decode failures as
//! [`ChannelError::ProtocolViolation`] so the transport can drop the peer.

use std::collections::VecDeque;

use crate::codec::{decode, encode};
use crate::error::ProtocolError;
use crate::messages::Message;

/// Errors from sending or receiving over a [`MessageChannel`].
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The peer has gone away.
    #[error("channel closed")]
    Closed,

    /// The underlying transport failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent a frame that does not decode. Close or resync.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolError),
}

/// A bidirectional channel of whole frames.
pub trait MessageChannel {
    /// Sends one frame.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError>;

    /// Takes the next frame, or `None` if none is waiting.
    fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, ChannelError>;
}

/// Encodes `msg` and sends it.
///
/// Returns `true` if the frame went out partial (a chunk frame cut at its
/// byte budget, or a player list cut at 255 entries).
pub fn send<C: MessageChannel + ?Sized>(
    channel: &mut C,
    msg: &Message,
) -> Result<bool, ChannelError> {
    let frame = encode(msg);
    channel.send_frame(&frame.bytes)?;
    Ok(frame.partial)
}

/// Receives and decodes the next message, if one is waiting.
pub fn receive<C: MessageChannel + ?Sized>(channel: &mut C) -> Result<Option<Message>, ChannelError> {
    let Some(frame) = channel.recv_frame()? else {
        return Ok(None);
    };
    match decode(&frame) {
        Ok(msg) => Ok(Some(msg)),
        Err(e) => {
            tracing::warn!(len = frame.len(), "dropping undecodable frame: {}", e);
            Err(e.into())
        }
    }
}

/// In-memory channel that hands frames back in send order.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
    queue: VecDeque<Vec<u8>>,
    closed: bool,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames waiting to be received.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Rejects further sends. Frames already queued can still be received.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl MessageChannel for LoopbackChannel {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.queue.push_back(frame.to_vec());
        Ok(())
    }

    fn recv_frame(&mut self) -> Result<Option<Vec<u8>>, ChannelError> {
        match self.queue.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None if self.closed => Err(ChannelError::Closed),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{EntityDestroy, ItemStack};

    #[test]
    fn test_loopback_preserves_order() {
        let mut ch = LoopbackChannel::new();
        assert!(!send(&mut ch, &Message::KeepAlive).unwrap());
        assert!(!send(&mut ch, &Message::EntityDestroy(EntityDestroy { id: 5 })).unwrap());
        assert_eq!(ch.pending(), 2);
        assert_eq!(receive(&mut ch).unwrap(), Some(Message::KeepAlive));
        assert_eq!(
            receive(&mut ch).unwrap(),
            Some(Message::EntityDestroy(EntityDestroy { id: 5 }))
        );
        assert_eq!(receive(&mut ch).unwrap(), None);
    }

    #[test]
    fn test_bad_frame_is_protocol_violation() {
        let mut ch = LoopbackChannel::new();
        ch.send_frame(&[0x0E, 0, 0]).unwrap();
        let err = receive(&mut ch).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::ProtocolViolation(ProtocolError::Underflow { .. })
        ));
    }

    #[test]
    fn test_closed_channel() {
        let mut ch = LoopbackChannel::new();
        send(&mut ch, &Message::AddItem(ItemStack { color: 1, count: 2 })).unwrap();
        ch.close();
        assert!(matches!(
            send(&mut ch, &Message::Disconnect),
            Err(ChannelError::Closed)
        ));
        assert!(receive(&mut ch).unwrap().is_some());
        assert!(matches!(receive(&mut ch), Err(ChannelError::Closed)));
    }
}
