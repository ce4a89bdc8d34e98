//! Big-endian frame builder and bounds-checked frame reader.

use crate::error::ProtocolError;
use crate::messages::PacketKind;

/// Builds one outbound frame, starting with its kind byte.
#[derive(Debug)]
pub struct FrameWriter {
    buf: Vec<u8>,
    partial: bool,
}

impl FrameWriter {
    /// Starts a frame of `kind` with room for `capacity` bytes.
    pub fn new(kind: PacketKind, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.max(1));
        buf.push(kind as u8);
        Self {
            buf,
            partial: false,
        }
    }

    /// Bytes written so far, kind byte included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Always false: a frame holds at least its kind byte.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Records that part of the payload was dropped to stay within budget.
    pub fn mark_partial(&mut self) {
        self.partial = true;
    }

    /// True if [`mark_partial`](Self::mark_partial) was called.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    /// Writes an `i32` byte length followed by the UTF-8 bytes.
    pub fn put_str(&mut self, s: &str) {
        self.put_i32(s.len() as i32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Consumes the writer, returning the frame bytes and the partial flag.
    pub fn finish(self) -> (Vec<u8>, bool) {
        (self.buf, self.partial)
    }
}

/// Reads fields from an inbound frame's payload.
#[derive(Debug)]
pub struct FrameReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    /// Reads `payload`, which excludes the kind byte.
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            data: payload,
            pos: 0,
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True while any bytes remain; used to detect optional trailing fields.
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::Underflow {
                field,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    pub fn get_u8(&mut self, field: &'static str) -> Result<u8, ProtocolError> {
        Ok(self.array::<1>(field)?[0])
    }

    pub fn get_bool(&mut self, field: &'static str) -> Result<bool, ProtocolError> {
        Ok(self.get_u8(field)? == 1)
    }

    pub fn get_i32(&mut self, field: &'static str) -> Result<i32, ProtocolError> {
        self.array(field).map(i32::from_be_bytes)
    }

    pub fn get_f32(&mut self, field: &'static str) -> Result<f32, ProtocolError> {
        self.array(field).map(f32::from_be_bytes)
    }

    pub fn get_f64(&mut self, field: &'static str) -> Result<f64, ProtocolError> {
        self.array(field).map(f64::from_be_bytes)
    }

    /// Reads an `i32` byte length followed by that many UTF-8 bytes.
    pub fn get_str(&mut self, field: &'static str) -> Result<String, ProtocolError> {
        let len = self.get_i32(field)?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength { field, len })?;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8 { field })
    }

    /// Reads `field` only if bytes remain; a field that starts but is cut
    /// short is still an underflow.
    pub fn optional<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<Option<T>, ProtocolError> {
        if self.has_remaining() {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }
}
