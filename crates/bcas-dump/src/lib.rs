//! `bcas-dump`: replay B-CAS card captures through the pseudo card.
//!
//! Reads a raw card stream capture, feeds it to a [`bcas_core::PseudoCard`]
//! in fixed-size chunks and prints decoded frames or captured ECM exchanges.
//! Afterwards it can answer ECM lookups against the loaded capture and print
//! the card's init status as a config table.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod run;

pub use cli::{Args, Mode};
pub use config::DumpConfig;
pub use error::DumpError;
pub use run::{RunSummary, preload, run};
