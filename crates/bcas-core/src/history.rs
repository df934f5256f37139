//! Bounded history of completed ECM exchanges.

use std::{collections::VecDeque, time::Instant};

use bcas_proto::ScrambleKey;
use bytes::Bytes;

use crate::lookup::EcmLookupTable;

/// Records kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 128;

/// A request body paired with the response the card gave for it.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcmRecord {
    request_body: Bytes,
    flag: u16,
    key: ScrambleKey,
    arrived_at: Instant,
}

impl EcmRecord {
    /// Pair a request body with its response.
    pub fn new(request_body: Bytes, flag: u16, key: ScrambleKey, arrived_at: Instant) -> Self {
        Self { request_body, flag, key, arrived_at }
    }

    /// ECM body the request carried.
    pub fn request_body(&self) -> &Bytes {
        &self.request_body
    }

    /// Flag from the response.
    pub fn flag(&self) -> u16 {
        self.flag
    }

    /// Scramble key pair from the response.
    pub fn key(&self) -> &ScrambleKey {
        &self.key
    }

    /// When the response was seen.
    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    record: EcmRecord,
}

/// FIFO of [`EcmRecord`]s with a fixed maximum length.
///
/// Every push that takes the history over capacity evicts exactly one record,
/// the oldest. The lookup index is updated in the same call, so a record is
/// findable exactly as long as it is retained.
#[derive(Debug, Clone)]
pub struct EcmHistory {
    entries: VecDeque<Entry>,
    capacity: usize,
    /// Sequence number the next record gets
    next_seq: u64,
    index: EcmLookupTable,
}

impl EcmHistory {
    /// Create an empty history holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            next_seq: 0,
            index: EcmLookupTable::new(),
        }
    }

    /// Append a record, returning the one evicted to make room.
    pub fn push(&mut self, record: EcmRecord) -> Option<EcmRecord> {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.index.insert(record.request_body.clone(), seq);
        self.entries.push_back(Entry { seq, record });

        if self.entries.len() > self.capacity { self.evict_oldest() } else { None }
    }

    /// Change the maximum length, evicting oldest records until it fits.
    ///
    /// Returns how many records were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity;
        let mut evicted = 0;
        while self.entries.len() > self.capacity && self.evict_oldest().is_some() {
            evicted += 1;
        }
        evicted
    }

    fn evict_oldest(&mut self) -> Option<EcmRecord> {
        let Entry { seq, record } = self.entries.pop_front()?;
        self.index.remove(&record.request_body, seq);
        Some(record)
    }

    /// Newest record whose request body equals `body`.
    pub fn find(&self, body: &[u8]) -> Option<&EcmRecord> {
        let seq = self.index.get(body)?;
        let front = self.entries.front()?.seq;
        let position = usize::try_from(seq.checked_sub(front)?).ok()?;
        self.entries.get(position).map(|entry| &entry.record)
    }

    /// Retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EcmRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// Newest record, if any.
    pub fn latest(&self) -> Option<&EcmRecord> {
        self.entries.back().map(|entry| &entry.record)
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no record is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every record, keeping the capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl Default for EcmHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn record(body: &[u8], flag: u16) -> EcmRecord {
        EcmRecord::new(
            Bytes::copy_from_slice(body),
            flag,
            ScrambleKey::new([flag as u8; 16]),
            Instant::now(),
        )
    }

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut history = EcmHistory::new(3);
        assert!(history.push(record(b"a", 1)).is_none());
        assert!(history.push(record(b"b", 2)).is_none());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn push_over_capacity_evicts_oldest() {
        let mut history = EcmHistory::new(2);
        history.push(record(b"a", 1));
        history.push(record(b"b", 2));
        let evicted = history.push(record(b"c", 3)).unwrap();

        assert_eq!(evicted.request_body().as_ref(), b"a");
        assert!(history.find(b"a").is_none());
        assert_eq!(history.find(b"c").unwrap().flag(), 3);
        let flags: Vec<u16> = history.iter().map(EcmRecord::flag).collect();
        assert_eq!(flags, vec![2, 3]);
    }

    #[test]
    fn duplicate_body_finds_newest() {
        let mut history = EcmHistory::new(4);
        history.push(record(b"dup", 1));
        history.push(record(b"other", 2));
        history.push(record(b"dup", 3));
        assert_eq!(history.find(b"dup").unwrap().flag(), 3);
    }

    #[test]
    fn evicting_older_duplicate_keeps_newer_findable() {
        let mut history = EcmHistory::new(2);
        history.push(record(b"dup", 1));
        history.push(record(b"dup", 2));
        history.push(record(b"x", 3));

        assert_eq!(history.len(), 2);
        assert_eq!(history.find(b"dup").unwrap().flag(), 2);
    }

    #[test]
    fn shrinking_capacity_truncates_oldest_first() {
        let mut history = EcmHistory::new(5);
        for i in 0..5u8 {
            history.push(record(&[i], u16::from(i)));
        }

        assert_eq!(history.set_capacity(2), 3);
        assert_eq!(history.len(), 2);
        assert!(history.find(&[2]).is_none());
        assert_eq!(history.find(&[4]).unwrap().flag(), 4);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let mut history = EcmHistory::new(0);
        let evicted = history.push(record(b"a", 1));
        assert_eq!(evicted.unwrap().flag(), 1);
        assert!(history.is_empty());
        assert!(history.find(b"a").is_none());
    }

    #[test]
    fn find_on_empty_history_is_none() {
        let history = EcmHistory::default();
        assert!(history.find(b"anything").is_none());
        assert_eq!(history.capacity(), DEFAULT_CAPACITY);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push,
        SetCapacity(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![4 => Just(Op::Push), 1 => (0usize..8).prop_map(Op::SetCapacity)]
    }

    proptest! {
        #[test]
        fn retained_count_tracks_capacity(
            initial in 0usize..8,
            ops in prop::collection::vec(op_strategy(), 0..64),
        ) {
            let mut history = EcmHistory::new(initial);
            let mut expected = 0usize;
            let mut pushed = 0u32;

            for op in ops {
                match op {
                    Op::Push => {
                        history.push(record(&pushed.to_be_bytes(), 0));
                        expected = (expected + 1).min(history.capacity());
                        pushed += 1;
                    },
                    Op::SetCapacity(capacity) => {
                        let dropped = history.set_capacity(capacity);
                        prop_assert_eq!(dropped, expected.saturating_sub(capacity));
                        expected = expected.min(capacity);
                    },
                }

                prop_assert_eq!(history.len(), expected);
                prop_assert!(history.len() <= history.capacity());
                let retained = u32::try_from(expected).unwrap();
                for i in pushed - retained..pushed {
                    prop_assert!(history.find(&i.to_be_bytes()).is_some());
                }
            }
        }
    }
}
