//! Reproducible ways of splitting a capture into transport chunks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// How a byte stream is cut before it reaches [`bcas_proto::FrameCodec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    /// One chunk with everything
    Whole,
    /// Chunks of this size (the last may be shorter); 0 acts as 1
    Fixed(usize),
    /// Chunk sizes drawn uniformly from `1..=max` with a seeded RNG
    Random {
        /// RNG seed
        seed: u64,
        /// Largest chunk
        max: usize,
    },
}

impl ChunkPlan {
    /// One byte at a time.
    pub const BYTEWISE: Self = Self::Fixed(1);

    /// Cut `bytes` according to the plan.
    pub fn split<'a>(&self, bytes: &'a [u8]) -> Vec<&'a [u8]> {
        match *self {
            Self::Whole => vec![bytes],
            Self::Fixed(size) => bytes.chunks(size.max(1)).collect(),
            Self::Random { seed, max } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let mut rest = bytes;
                let mut chunks = Vec::new();
                while !rest.is_empty() {
                    let take = rng.gen_range(1..=max.max(1)).min(rest.len());
                    let (head, tail) = rest.split_at(take);
                    chunks.push(head);
                    rest = tail;
                }
                chunks
            },
        }
    }
}
