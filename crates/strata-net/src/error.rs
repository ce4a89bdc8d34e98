//! Protocol error types.

use crate::messages::PacketKind;

/// Errors raised while decoding a frame.
///
/// Any of these means the peer sent something this build cannot parse; the
/// transport should treat it as a protocol violation rather than skip it.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame had no kind byte.
    #[error("empty frame")]
    EmptyFrame,

    /// The kind byte is not one this build knows.
    #[error("unknown packet kind 0x{0:02X}")]
    UnknownKind(u8),

    /// A typed decoder was handed a frame of another kind.
    #[error("expected {expected:?} frame, got {found:?}")]
    UnexpectedKind {
        /// Kind the decoder handles.
        expected: PacketKind,
        /// Kind found in the frame.
        found: PacketKind,
    },

    /// A field was present but the frame ended before it was complete.
    #[error("frame underflow reading {field}: need {needed} bytes, {remaining} remaining")]
    Underflow {
        /// Field being read.
        field: &'static str,
        /// Bytes the field needs.
        needed: usize,
        /// Bytes left in the frame.
        remaining: usize,
    },

    /// A length prefix was negative.
    #[error("negative length {len} for {field}")]
    NegativeLength {
        /// Field being read.
        field: &'static str,
        /// The decoded length.
        len: i32,
    },

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 {
        /// Field being read.
        field: &'static str,
    },
}
