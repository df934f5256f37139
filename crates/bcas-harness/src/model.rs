//! Reference model of the pseudo card for model-based tests.
//!
//! [`ModelCard`] implements the card's observable behaviour as directly as
//! possible: a pending slot, a `VecDeque` of records searched from the back,
//! and a flag tracking whether the codec would currently be in sync.
//! [`Operation::encode`] produces the wire bytes the real card is fed for the
//! same step.
//!
//! Bodies and keys are drawn from `0x40..=0x7f` so no byte sequence in an
//! operation stream can be mistaken for a request tag while the codec scans.

use std::collections::VecDeque;

use arbitrary::{Arbitrary, Unstructured};
use bcas_proto::{ProtocolError, ScrambleKey};

use crate::capture::{CaptureBuilder, STATUS_FRAME};

/// Flags real cards return.
pub const FLAGS: [u16; 3] = [0x0200, 0x0400, 0x0800];

/// ECM body built from a small alphabet so distinct values collide often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallBody(Vec<u8>);

impl SmallBody {
    /// Shortest body; keeps request frames above the codec's minimum size.
    pub const MIN_LEN: usize = 14;

    /// Build a body of `MIN_LEN + extra % 4` bytes from `seed`.
    pub fn new(seed: u8, extra: u8) -> Self {
        let len = Self::MIN_LEN + usize::from(extra % 4);
        Self((0..len).map(|i| 0x40 | ((seed % 4).wrapping_add(i as u8) & 0x3f)).collect())
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<'a> Arbitrary<'a> for SmallBody {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        Ok(Self::new(u.arbitrary()?, u.arbitrary()?))
    }
}

/// One step of a card session.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Capture an ECM request
    Request {
        /// ECM body
        body: SmallBody,
    },
    /// Capture an ECM response
    Response {
        /// Index into [`FLAGS`]
        flag: u8,
        /// Key byte, repeated
        key: u8,
    },
    /// Capture an unrelated status frame
    Status,
    /// Capture a request with a broken checksum, losing sync
    Corrupt {
        /// ECM body before corruption
        body: SmallBody,
    },
    /// Ask the card for a key
    Lookup {
        /// ECM body to look up
        body: SmallBody,
    },
    /// Change the history capacity
    SetCapacity {
        /// New capacity
        capacity: u8,
    },
    /// Let time pass
    AdvanceTime {
        /// Milliseconds to advance
        millis: u16,
    },
}

impl Operation {
    /// Response flag for a `Response` step.
    pub fn response_flag(flag: u8) -> u16 {
        FLAGS[usize::from(flag) % FLAGS.len()]
    }

    /// Response key for a `Response` step.
    pub fn response_key(key: u8) -> ScrambleKey {
        ScrambleKey::new([0x40 | (key & 0x3f); 16])
    }

    /// Wire bytes this step feeds to the card, empty for non-stream steps.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let builder = match self {
            Self::Request { body } => CaptureBuilder::new().request(body.as_bytes()),
            Self::Response { flag, key } => {
                CaptureBuilder::new().response(Self::response_flag(*flag), Self::response_key(*key))
            },
            Self::Status => CaptureBuilder::new().garbage(&STATUS_FRAME),
            Self::Corrupt { body } => CaptureBuilder::new().corrupt_request(body.as_bytes(), 6),
            Self::Lookup { .. } | Self::SetCapacity { .. } | Self::AdvanceTime { .. } => {
                return Ok(Vec::new());
            },
        };
        builder.build().map(|capture| capture.bytes)
    }
}

/// Record as the model keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
    /// ECM body
    pub body: Vec<u8>,
    /// Response flag
    pub flag: u16,
    /// Response key
    pub key: ScrambleKey,
    /// Model time the response arrived, in milliseconds
    pub arrived_ms: u64,
}

/// Reference pseudo card.
#[derive(Debug, Clone)]
pub struct ModelCard {
    records: VecDeque<ModelRecord>,
    capacity: usize,
    pending: Option<Vec<u8>>,
    synced: bool,
    now_ms: u64,
    arrived: u64,
    failed: u64,
    latencies: Vec<u64>,
}

impl ModelCard {
    /// Empty model keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity,
            pending: None,
            synced: false,
            now_ms: 0,
            arrived: 0,
            failed: 0,
            latencies: Vec::new(),
        }
    }

    /// Apply one step; lookups return their answer.
    pub fn apply(&mut self, op: &Operation) -> Option<Result<(ScrambleKey, u16), ()>> {
        match op {
            Operation::Request { body } => {
                if !self.synced {
                    // The codec anchors on this request; first frame after sync.
                    self.synced = true;
                }
                self.pending = Some(body.as_bytes().to_vec());
            },
            Operation::Response { flag, key } => {
                let Some(body) = self.pending.take().filter(|_| self.synced) else {
                    return None;
                };
                self.records.push_back(ModelRecord {
                    body,
                    flag: Operation::response_flag(*flag),
                    key: Operation::response_key(*key),
                    arrived_ms: self.now_ms,
                });
                self.arrived += 1;
                if self.records.len() > self.capacity {
                    self.records.pop_front();
                }
            },
            Operation::Status => {},
            Operation::Corrupt { .. } => {
                // Whatever was pending is dropped when the next request re-anchors.
                self.synced = false;
                self.pending = None;
            },
            Operation::Lookup { body } => return Some(self.lookup(body.as_bytes())),
            Operation::SetCapacity { capacity } => {
                self.capacity = usize::from(*capacity);
                while self.records.len() > self.capacity {
                    self.records.pop_front();
                }
            },
            Operation::AdvanceTime { millis } => self.now_ms += u64::from(*millis),
        }
        None
    }

    fn lookup(&mut self, body: &[u8]) -> Result<(ScrambleKey, u16), ()> {
        match self.records.iter().rev().find(|record| record.body == body) {
            Some(record) => {
                self.latencies.push(self.now_ms - record.arrived_ms);
                Ok((record.key, record.flag))
            },
            None => {
                self.failed += 1;
                Err(())
            },
        }
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &ModelRecord> {
        self.records.iter()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records captured so far.
    pub fn arrived(&self) -> u64 {
        self.arrived
    }

    /// Failed lookups so far.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Shortest and longest lookup latency in milliseconds.
    pub fn latency_range(&self) -> Option<(u64, u64)> {
        let min = self.latencies.iter().min()?;
        let max = self.latencies.iter().max()?;
        Some((*min, *max))
    }
}
