//! Dump tool errors.

use std::{io, path::PathBuf};

use bcas_core::CardError;
use thiserror::Error;

/// Anything that stops a dump run.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Capture or config file could not be opened.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Reading the capture failed part way.
    #[error("failed to read capture: {0}")]
    Read(#[source] io::Error),

    /// Writing the dump failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    /// Config file is not valid TOML for [`crate::config::DumpConfig`].
    #[error("invalid config {path}: {source}")]
    Config {
        /// Config file
        path: PathBuf,
        /// Parse error
        #[source]
        source: toml::de::Error,
    },

    /// A `--lookup` argument is not hex.
    #[error("invalid lookup body {input:?}: {source}")]
    LookupHex {
        /// Argument as given
        input: String,
        /// Decode error
        #[source]
        source: hex::FromHexError,
    },

    /// Card rejected the configuration or init status.
    #[error(transparent)]
    Card(#[from] CardError),
}
