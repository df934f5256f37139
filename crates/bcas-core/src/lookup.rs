//! Exact-match index from ECM body to history entry.

use std::collections::HashMap;

use bytes::Bytes;

/// Maps a request body to the sequence number of its newest record.
///
/// Owned by [`crate::EcmHistory`], which keeps it in step with insertions
/// and evictions. Two bodies only match when they are byte-for-byte equal;
/// when the window holds the same body twice, the newer record shadows the
/// older one.
#[derive(Debug, Default, Clone)]
pub struct EcmLookupTable {
    entries: HashMap<Bytes, u64>,
}

impl EcmLookupTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `body` at `seq`, replacing any older entry.
    pub fn insert(&mut self, body: Bytes, seq: u64) {
        self.entries.insert(body, seq);
    }

    /// Remove `body` only if it still points at `seq`.
    ///
    /// An evicted record must not take a newer duplicate's entry with it.
    pub fn remove(&mut self, body: &[u8], seq: u64) -> bool {
        if self.entries.get(body) == Some(&seq) {
            self.entries.remove(body);
            true
        } else {
            false
        }
    }

    /// Sequence number of the newest record for `body`.
    pub fn get(&self, body: &[u8]) -> Option<u64> {
        self.entries.get(body).copied()
    }

    /// Number of distinct bodies indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
