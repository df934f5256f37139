//! Validated frame.

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// XOR of every byte in `bytes`.
///
/// The checksum byte of a frame is the XOR of its header and payload.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// A complete, checksum-verified frame.
///
/// The payload length always matches the header's `declared_length`, which
/// the constructors enforce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Bytes,
}

impl Frame {
    /// Largest payload the 1-byte length field can describe.
    pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

    /// Build a frame around `payload`.
    pub fn new(marker: u16, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let len = u8::try_from(payload.len()).map_err(|_| ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: Self::MAX_PAYLOAD_SIZE,
        })?;

        Ok(Self { header: FrameHeader::new(marker, len), payload })
    }

    /// Assemble from parts the codec has already validated.
    pub(crate) fn from_parts(header: FrameHeader, payload: Bytes) -> Self {
        debug_assert_eq!(header.declared_length() as usize, payload.len());
        Self { header, payload }
    }

    /// Decode exactly one frame from the start of `bytes`.
    ///
    /// Returns the frame and the number of bytes it occupied. Unlike
    /// [`crate::FrameCodec`] this performs no resynchronisation.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let header = FrameHeader::from_bytes(bytes)?;
        let size = header.frame_size();
        if bytes.len() < size {
            return Err(ProtocolError::Truncated { expected: size, actual: bytes.len() });
        }

        let stored = bytes[size - 1];
        let computed = xor_checksum(&bytes[..size - 1]);
        if stored != computed {
            return Err(ProtocolError::MalformedFrame { stored, computed });
        }

        let payload = Bytes::copy_from_slice(&bytes[FrameHeader::SIZE..size - 1]);
        Ok((Self { header, payload }, size))
    }

    /// Header of this frame.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Marker from the header.
    pub fn marker(&self) -> u16 {
        self.header.marker()
    }

    /// Payload length from the header.
    pub fn declared_length(&self) -> u8 {
        self.header.declared_length()
    }

    /// Payload bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Checksum byte this frame encodes with.
    pub fn checksum(&self) -> u8 {
        xor_checksum(&self.header.to_bytes()) ^ xor_checksum(&self.payload)
    }

    /// Size on the wire.
    pub fn encoded_len(&self) -> usize {
        self.header.frame_size()
    }

    /// Write the frame (header, payload, checksum) to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);
        dst.put_u8(self.checksum());
    }

    /// Encode into a fresh vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }
}
