//! Wire format for the B-CAS card command stream.
//!
//! The receiver's card interface is tapped and delivered as a raw byte stream
//! with no framing of its own. Each command or reply travels as a small frame:
//! a 3-byte header (2-byte marker, 1-byte payload length), the payload, and a
//! trailing XOR checksum over everything before it.
//!
//! [`FrameCodec`] turns arbitrarily chunked input back into validated
//! [`Frame`]s. The stream has no unique start marker, so the codec anchors on
//! the ECM request command tag (`90 34 00 00`) whenever it has to
//! (re)synchronise. [`ecm`] classifies decoded frames into the ECM request and
//! response shapes the pseudo card cares about.
//!
//! # Security
//!
//! Header access goes through compile-time verified layouts via `zerocopy`.
//! A frame is never handed out before its length and checksum are verified.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod ecm;
pub mod errors;
pub mod frame;
pub mod header;

pub use codec::{CodecStats, DecodedFrame, FrameCodec, Frames, SyncState};
pub use ecm::{EcmRequest, EcmResponse, FrameKind, ScrambleKey};
pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use header::FrameHeader;
