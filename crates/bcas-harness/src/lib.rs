//! Deterministic test harness for the pseudo B-CAS card.
//!
//! Builds synthetic card captures, splits them into reproducible chunk
//! sequences, injects faults and replays the result through the codec and
//! card. A manual clock ([`SimEnv`]) makes latency figures exact, and
//! [`ModelCard`] is the reference model for model-based tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capture;
pub mod chunking;
pub mod faults;
pub mod model;
pub mod replay;
pub mod sim_env;

pub use capture::{Capture, CaptureBuilder};
pub use chunking::ChunkPlan;
pub use model::{ModelCard, ModelRecord, Operation, SmallBody};
pub use replay::{decode_frames, feed_card};
pub use sim_env::SimEnv;
