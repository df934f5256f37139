//! Card personalisation data and monitoring counters.

use std::time::Duration;

use crate::error::CardError;

/// Length of the system key.
pub const SYSTEM_KEY_SIZE: usize = 32;

/// Length of the initial CBC vector.
pub const INIT_CBC_SIZE: usize = 8;

/// Personalisation data the descrambler needs before the first ECM.
///
/// Either present and complete or absent; there is no partially valid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStatus {
    system_key: [u8; SYSTEM_KEY_SIZE],
    init_cbc: [u8; INIT_CBC_SIZE],
}

impl InitStatus {
    /// Build from raw bytes.
    pub fn new(system_key: [u8; SYSTEM_KEY_SIZE], init_cbc: [u8; INIT_CBC_SIZE]) -> Self {
        Self { system_key, init_cbc }
    }

    /// Decode both values from hex.
    ///
    /// Fails unless both strings are hex of exactly the right length.
    /// Surrounding whitespace is ignored.
    pub fn from_hex(system_key: &str, init_cbc: &str) -> Result<Self, CardError> {
        Ok(Self {
            system_key: decode_fixed("system_key", system_key)?,
            init_cbc: decode_fixed("init_cbc", init_cbc)?,
        })
    }

    /// 32-byte system key.
    pub fn system_key(&self) -> &[u8; SYSTEM_KEY_SIZE] {
        &self.system_key
    }

    /// 8-byte initial CBC vector.
    pub fn init_cbc(&self) -> &[u8; INIT_CBC_SIZE] {
        &self.init_cbc
    }
}

fn decode_fixed<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N], CardError> {
    let mut out = [0u8; N];
    hex::decode_to_slice(text.trim(), &mut out)
        .map_err(|e| CardError::InvalidFormat { field, reason: e.to_string() })?;
    Ok(out)
}

/// Snapshot of the card's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardStatus {
    /// Records currently held
    pub current_queue_len: usize,
    /// Maximum records held
    pub queue_capacity: usize,
    /// ECM exchanges captured since init
    pub n_ecm_arrived: u64,
    /// Lookups that found no record
    pub n_ecm_failed: u64,
    /// Shortest time between capture and lookup
    pub min_latency: Option<Duration>,
    /// Longest time between capture and lookup
    pub max_latency: Option<Duration>,
}

impl CardStatus {
    /// Whether any key material has been captured yet.
    ///
    /// Descramblers hold transport stream data back until this is true.
    pub fn has_key_material(&self) -> bool {
        self.n_ecm_arrived > 0
    }
}
