//! Pseudo B-CAS card core logic
//!
//! Pure state machines that turn a captured card stream into answers for a
//! descrambler, decoupled from I/O. The enclosing application reads the
//! capture (file, USB tap) and feeds bytes in; this crate never blocks.
//!
//! # Architecture
//!
//! ```text
//! bytes ─> FrameCodec ─> EcmCorrelator ─> EcmHistory ─> EcmLookupTable
//!                                                            │
//!                         descrambler ─> process_ecm ────────┘
//! ```
//!
//! The only external effect is time, supplied through [`Environment`] so
//! latency figures are deterministic under test.
//!
//! # Components
//!
//! - [`correlator`]: pairs ECM requests with responses
//! - [`history`]: bounded FIFO of completed exchanges
//! - [`lookup`]: exact-match index over the history
//! - [`card`]: the pseudo card driver and the [`BcasCard`] trait
//! - [`shared`]: mutex-guarded handle for multi-threaded use
//! - [`config`], [`status`]: configuration and personalisation data
//! - [`mod@env`]: clock abstraction
//! - [`error`]: card error types

pub mod card;
pub mod config;
pub mod correlator;
pub mod env;
pub mod error;
pub mod history;
pub mod lookup;
pub mod shared;
pub mod status;

pub use card::{BcasCard, EcmResult, PseudoCard};
pub use config::CardConfig;
pub use correlator::{
    CorrelatorEvent, CorrelatorState, CorrelatorStats, EcmCorrelator, PendingRequest,
};
pub use env::{Environment, SystemEnv};
pub use error::CardError;
pub use history::{DEFAULT_CAPACITY, EcmHistory, EcmRecord};
pub use lookup::EcmLookupTable;
pub use shared::SharedCard;
pub use status::{CardStatus, InitStatus};
