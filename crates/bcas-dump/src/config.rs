//! Config file loading.
//!
//! ```toml
//! [card]
//! queue_capacity = 128
//! system_key = "…64 hex digits…"
//! init_cbc = "…16 hex digits…"
//! ```

use std::{fs, path::Path};

use bcas_core::CardConfig;
use serde::{Deserialize, Serialize};

use crate::{cli::Args, error::DumpError};

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Pseudo card settings
    pub card: CardConfig,
}

impl DumpConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, DumpError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| DumpError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| DumpError::Config { path: path.to_path_buf(), source })
    }

    /// Config from `--config` (if any) with command-line overrides applied.
    pub fn resolve(args: &Args) -> Result<Self, DumpError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(capacity) = args.queue_size {
            config.card.queue_capacity = capacity;
        }
        if let Some(system_key) = &args.system_key {
            config.card.system_key = Some(system_key.clone());
        }
        if let Some(init_cbc) = &args.init_cbc {
            config.card.init_cbc = Some(init_cbc.clone());
        }
        Ok(config)
    }
}
