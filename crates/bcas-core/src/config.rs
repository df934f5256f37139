//! Card configuration.

use serde::{Deserialize, Serialize};

use crate::{
    error::CardError,
    history::DEFAULT_CAPACITY,
    status::InitStatus,
};

/// Settings applied by [`crate::PseudoCard::init`].
///
/// Deserialises from the `[card]` table of a config file. Missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Maximum number of ECM records kept for lookup
    pub queue_capacity: usize,
    /// System key as 64 hex digits
    pub system_key: Option<String>,
    /// Initial CBC vector as 16 hex digits
    pub init_cbc: Option<String>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_CAPACITY, system_key: None, init_cbc: None }
    }
}

impl CardConfig {
    /// Decode the configured init status, if any.
    ///
    /// Both keys or neither must be set.
    pub fn init_status(&self) -> Result<Option<InitStatus>, CardError> {
        match (&self.system_key, &self.init_cbc) {
            (None, None) => Ok(None),
            (Some(system_key), Some(init_cbc)) => {
                InitStatus::from_hex(system_key, init_cbc).map(Some)
            },
            (Some(_), None) => Err(CardError::InvalidFormat {
                field: "init_cbc",
                reason: "missing while system_key is set".to_string(),
            }),
            (None, Some(_)) => Err(CardError::InvalidFormat {
                field: "system_key",
                reason: "missing while init_cbc is set".to_string(),
            }),
        }
    }
}
