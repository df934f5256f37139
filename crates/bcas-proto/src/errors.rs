//! Protocol error types.

use thiserror::Error;

/// Result alias for wire-format operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
///
/// Inside [`crate::FrameCodec`] these are recovered locally (discard and
/// resynchronise); they only reach callers of the one-shot helpers such as
/// [`crate::Frame::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload does not fit the 1-byte length field.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Largest encodable payload
        max: usize,
    },

    /// Not enough bytes for the frame the header announces.
    #[error("frame truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Trailing checksum byte does not match the XOR of the frame.
    #[error("malformed frame: checksum {stored:#04x}, computed {computed:#04x}")]
    MalformedFrame {
        /// Checksum byte carried by the frame
        stored: u8,
        /// XOR of header and payload
        computed: u8,
    },

    /// ECM request whose `data_len` runs past the end of the payload.
    #[error("ECM request declares {declared} data bytes but only {available} present")]
    TruncatedEcmRequest {
        /// `data_len` byte from the payload
        declared: usize,
        /// Bytes following the `data_len` byte
        available: usize,
    },

    /// ECM response tag with a payload of the wrong size.
    #[error("ECM response payload must be 25 bytes, got {len}")]
    InvalidEcmResponse {
        /// Actual payload length
        len: usize,
    },
}
