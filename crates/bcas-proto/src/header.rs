//! Frame header.

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned, byteorder::big_endian::U16,
};

use crate::errors::{ProtocolError, Result};

/// 3-byte frame header: big-endian marker followed by the payload length.
///
/// ```text
/// ┌───────────┬───────────┬─────────────────┐
/// │ marker_hi │ marker_lo │ declared_length │
/// └───────────┴───────────┴─────────────────┘
/// ```
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct FrameHeader {
    marker: U16,
    declared_length: u8,
}

impl FrameHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 3;

    /// Marker carried by the card-side frames in every capture seen so far.
    pub const DEFAULT_MARKER: u16 = 0x0040;

    /// Build a header.
    pub fn new(marker: u16, declared_length: u8) -> Self {
        Self { marker: U16::new(marker), declared_length }
    }

    /// Read a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read_from_prefix(bytes)
            .map(|(header, _rest)| header)
            .map_err(|_| ProtocolError::Truncated { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Header as wire bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Session marker (request/response channel identifier).
    pub fn marker(&self) -> u16 {
        self.marker.get()
    }

    /// Payload length announced by the header.
    pub fn declared_length(&self) -> u8 {
        self.declared_length
    }

    /// Full frame size: header, payload and checksum byte.
    pub fn frame_size(&self) -> usize {
        Self::SIZE + self.declared_length as usize + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_three_bytes() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
    }

    #[test]
    fn marker_is_big_endian() {
        let header = FrameHeader::new(0x0040, 0x24);
        assert_eq!(header.to_bytes(), [0x00, 0x40, 0x24]);

        let parsed = FrameHeader::from_bytes(&[0x12, 0x34, 0x05, 0xff]).unwrap();
        assert_eq!(parsed.marker(), 0x1234);
        assert_eq!(parsed.declared_length(), 5);
        assert_eq!(parsed.frame_size(), 9);
    }

    #[test]
    fn short_input_is_truncated() {
        let result = FrameHeader::from_bytes(&[0x00, 0x40]);
        assert_eq!(result, Err(ProtocolError::Truncated { expected: 3, actual: 2 }));
    }
}
