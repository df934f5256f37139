//! Incremental frame parser with resynchronisation.
//!
//! The tap delivers card traffic as an unframed byte stream in chunks of
//! arbitrary size. [`FrameCodec`] buffers the unconsumed tail and hands out
//! frames once they are complete and their checksum verifies.
//!
//! # Synchronisation
//!
//! ```text
//! ┌──────────┐  anchor found + whole frame buffered  ┌────────┐
//! │ Unsynced │──────────────────────────────────────>│ Synced │
//! └──────────┘                                       └────────┘
//!       ^                                                │
//!       │              checksum mismatch                 │
//!       └────────────────────────────────────────────────┘
//! ```
//!
//! The only content reliably recognisable without knowing frame boundaries is
//! the ECM request tag, so synchronisation always anchors on a frame whose
//! payload starts with `90 34 00 00`. A stream carrying nothing but responses
//! therefore never regains sync after corruption; real cards always answer a
//! request, so this does not happen on a healthy tap.
//!
//! The first frame after every (re)synchronisation is flagged with
//! [`DecodedFrame::first_after_sync`] so consumers can drop state that may
//! straddle the gap.

use bytes::{Buf, BytesMut};
use tracing::{debug, info, trace, warn};

use crate::{
    Frame, FrameHeader,
    ecm::{ECM_REQUEST_TAG, has_request_tag},
    errors::ProtocolError,
    frame::xor_checksum,
};

/// Fewest buffered bytes before a frame is parsed.
///
/// Header plus the smallest ECM-shaped payload.
pub const PACKET_MIN_SIZE: usize = 23;

/// Bytes needed to test one candidate anchor: header plus request tag.
const ANCHOR_WINDOW: usize = FrameHeader::SIZE + ECM_REQUEST_TAG.len();

/// Whether the codec currently trusts its frame alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Searching for an anchor
    #[default]
    Unsynced,
    /// Parsing frames back to back
    Synced,
}

/// A frame together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The verified frame
    pub frame: Frame,
    /// First frame since the codec (re)acquired sync
    pub first_after_sync: bool,
    /// Absolute stream offset of the frame's first byte
    pub offset: u64,
}

/// Running codec counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecStats {
    /// Frames emitted
    pub frames: u64,
    /// Frames rejected by checksum
    pub malformed: u64,
    /// Times sync was acquired
    pub syncs: u64,
    /// Bytes thrown away while searching for an anchor
    pub discarded: u64,
}

/// Stateful stream-to-frame parser.
///
/// Feed it with [`FrameCodec::push`] and drain the returned iterator. Bytes
/// that do not yet form a complete frame stay buffered for the next push.
#[derive(Debug, Default)]
pub struct FrameCodec {
    buffer: BytesMut,
    state: SyncState,
    /// Absolute offset of `buffer[0]`
    position: u64,
    frames_since_sync: u64,
    stats: CodecStats,
}

impl FrameCodec {
    /// Create an unsynchronised codec with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data` and return an iterator over the frames now available.
    ///
    /// The iterator is lazy. Frames it does not yield (because it was dropped
    /// early) are still buffered and will come out of the next push.
    pub fn push(&mut self, data: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(data);
        Frames { codec: self }
    }

    /// Parse the next frame from the buffer, if one is complete.
    pub fn next_frame(&mut self) -> Option<DecodedFrame> {
        loop {
            if self.state == SyncState::Unsynced && !self.try_sync() {
                return None;
            }

            if self.buffer.len() < PACKET_MIN_SIZE {
                return None;
            }

            let declared = self.buffer[2] as usize;
            let size = FrameHeader::SIZE + declared + 1;
            if self.buffer.len() < size {
                return None;
            }

            let stored = self.buffer[size - 1];
            let computed = xor_checksum(&self.buffer[..size - 1]);
            if stored != computed {
                let error = ProtocolError::MalformedFrame { stored, computed };
                warn!(offset = self.position, %error, "broken packet, resynchronising");
                self.stats.malformed += 1;
                self.state = SyncState::Unsynced;

                // Skip the tag of a broken request so the scan does not
                // re-anchor on the same frame.
                if has_request_tag(&self.buffer[FrameHeader::SIZE..]) {
                    self.discard(ANCHOR_WINDOW);
                }
                continue;
            }

            let offset = self.position;
            let mut raw = self.buffer.split_to(size).freeze();
            self.position += size as u64;

            let header = FrameHeader::new(u16::from_be_bytes([raw[0], raw[1]]), raw[2]);
            raw.advance(FrameHeader::SIZE);
            raw.truncate(declared);

            self.frames_since_sync += 1;
            self.stats.frames += 1;
            trace!(offset, marker = header.marker(), len = declared, "frame");

            return Some(DecodedFrame {
                frame: Frame::from_parts(header, raw),
                first_after_sync: self.frames_since_sync == 1,
                offset,
            });
        }
    }

    /// Scan for an anchor; true once synced with a whole frame buffered.
    fn try_sync(&mut self) -> bool {
        if self.buffer.len() < ANCHOR_WINDOW {
            return false;
        }

        let anchor = self
            .buffer
            .windows(ANCHOR_WINDOW)
            .position(|window| window[FrameHeader::SIZE..] == ECM_REQUEST_TAG);

        let Some(start) = anchor else {
            // Every start position with a full window has been ruled out. Keep
            // the tail, it may be the beginning of an anchor.
            let scanned = self.buffer.len() - ANCHOR_WINDOW;
            self.discard(scanned);
            return false;
        };

        if start > 0 {
            self.discard(start);
        }

        let needed = (FrameHeader::SIZE + self.buffer[2] as usize + 1).max(PACKET_MIN_SIZE);
        if self.buffer.len() < needed {
            debug!(
                offset = self.position,
                needed,
                buffered = self.buffer.len(),
                "anchor found, waiting for the rest of the frame"
            );
            return false;
        }

        info!(offset = self.position, skipped = start, "stream synchronised");
        self.state = SyncState::Synced;
        self.frames_since_sync = 0;
        self.stats.syncs += 1;
        true
    }

    fn discard(&mut self, count: usize) {
        let count = count.min(self.buffer.len());
        if count == 0 {
            return;
        }
        self.buffer.advance(count);
        self.position += count as u64;
        self.stats.discarded += count as u64;
    }

    /// Current synchronisation state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Absolute offset of the first unconsumed byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes buffered but not yet resolved.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Frames emitted since the last synchronisation.
    pub fn frames_since_sync(&self) -> u64 {
        self.frames_since_sync
    }

    /// Running counters.
    pub fn stats(&self) -> CodecStats {
        self.stats
    }
}

/// Iterator returned by [`FrameCodec::push`].
#[derive(Debug)]
pub struct Frames<'a> {
    codec: &'a mut FrameCodec,
}

impl Iterator for Frames<'_> {
    type Item = DecodedFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.codec.next_frame()
    }
}
