//! Pseudo B-CAS card driver.
//!
//! [`PseudoCard`] answers ECM lookups from a captured card stream instead of
//! a physical card. The capture is fed in with [`PseudoCard::push`]; the
//! descrambler asks for keys with [`PseudoCard::process_ecm`] through the
//! [`BcasCard`] trait, the same seam a real card reader would implement.

use std::time::Duration;

use bcas_proto::{CodecStats, DecodedFrame, FrameCodec, ScrambleKey};
use tracing::{debug, info, warn};

use crate::{
    config::CardConfig,
    correlator::{CorrelatorEvent, EcmCorrelator},
    env::Environment,
    error::CardError,
    history::EcmHistory,
    status::{CardStatus, INIT_CBC_SIZE, InitStatus, SYSTEM_KEY_SIZE},
};

/// Key material returned for an ECM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcmResult {
    /// Scramble key pair
    pub key: ScrambleKey,
    /// Flag the card returned with the key
    pub return_code: u16,
}

/// Operations a descrambler needs from a B-CAS card.
pub trait BcasCard {
    /// Reset the card to its configured initial state.
    fn init(&mut self) -> Result<(), CardError>;

    /// Personalisation data.
    fn get_init_status(&self) -> Result<InitStatus, CardError>;

    /// Key material for an ECM body.
    fn process_ecm(&mut self, request: &[u8]) -> Result<EcmResult, CardError>;

    /// Monitoring counters.
    fn get_status(&self) -> CardStatus;
}

#[derive(Debug, Clone, Copy)]
struct LatencyRange {
    min: Duration,
    max: Duration,
}

/// Software stand-in for a B-CAS card, backed by a captured stream.
///
/// Owns the whole pipeline for one stream: codec, correlator and history.
/// Not thread-safe by itself; see [`crate::SharedCard`].
#[derive(Debug)]
pub struct PseudoCard<E: Environment> {
    env: E,
    config: CardConfig,
    codec: FrameCodec,
    correlator: EcmCorrelator,
    init_status: Option<InitStatus>,
    n_ecm_failed: u64,
    latency: Option<LatencyRange>,
}

impl<E: Environment> PseudoCard<E> {
    /// Create a card with the default configuration.
    pub fn new(env: E) -> Self {
        Self::with_config(env, CardConfig::default())
    }

    /// Create a card that [`init`](BcasCard::init) will reset to `config`.
    ///
    /// The config is not validated until `init`.
    pub fn with_config(env: E, config: CardConfig) -> Self {
        let correlator = EcmCorrelator::new(config.queue_capacity);
        Self {
            env,
            config,
            codec: FrameCodec::new(),
            correlator,
            init_status: None,
            n_ecm_failed: 0,
            latency: None,
        }
    }

    /// Change the number of records kept, evicting the oldest if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.config.queue_capacity = capacity;
        let evicted = self.correlator.history_mut().set_capacity(capacity);
        if evicted > 0 {
            debug!(capacity, evicted, "history truncated");
        }
    }

    /// Install personalisation data.
    pub fn set_init_status(
        &mut self,
        system_key: [u8; SYSTEM_KEY_SIZE],
        init_cbc: [u8; INIT_CBC_SIZE],
    ) {
        self.init_status = Some(InitStatus::new(system_key, init_cbc));
    }

    /// Install personalisation data from hex strings.
    ///
    /// Nothing is installed unless both strings decode.
    pub fn set_init_status_from_hex(
        &mut self,
        system_key: &str,
        init_cbc: &str,
    ) -> Result<(), CardError> {
        self.init_status = Some(InitStatus::from_hex(system_key, init_cbc)?);
        Ok(())
    }

    /// Feed captured stream bytes.
    ///
    /// Returns what the correlator did with the frames they completed.
    pub fn push(&mut self, data: &[u8]) -> Vec<CorrelatorEvent> {
        self.push_with(data, |_| {})
    }

    /// Like [`push`](Self::push), also handing every decoded frame to
    /// `inspect` before the correlator sees it.
    pub fn push_with(
        &mut self,
        data: &[u8],
        mut inspect: impl FnMut(&DecodedFrame),
    ) -> Vec<CorrelatorEvent> {
        let mut events = Vec::new();
        for decoded in self.codec.push(data) {
            inspect(&decoded);
            let now = self.env.now();
            events.extend(self.correlator.on_frame(&decoded.frame, decoded.first_after_sync, now));
        }
        events
    }

    /// Look up the key material captured for `request`.
    pub fn process_ecm(&mut self, request: &[u8]) -> Result<EcmResult, CardError> {
        let Some(record) = self.correlator.history().find(request) else {
            warn!(body = %hex::encode(request), "ECM lookup failed");
            self.n_ecm_failed += 1;
            return Err(CardError::EcmNotFound { len: request.len() });
        };

        let result = EcmResult { key: *record.key(), return_code: record.flag() };
        let latency = self.env.now().saturating_duration_since(record.arrived_at());
        debug!(flag = result.return_code, ?latency, "ECM found");

        self.latency = Some(match self.latency {
            None => LatencyRange { min: latency, max: latency },
            Some(range) => {
                LatencyRange { min: range.min.min(latency), max: range.max.max(latency) }
            },
        });
        Ok(result)
    }

    /// Personalisation data, if installed.
    pub fn get_init_status(&self) -> Result<InitStatus, CardError> {
        self.init_status.ok_or(CardError::NotInitialized)
    }

    /// Snapshot of the card's counters.
    pub fn get_status(&self) -> CardStatus {
        let history = self.correlator.history();
        CardStatus {
            current_queue_len: history.len(),
            queue_capacity: history.capacity(),
            n_ecm_arrived: self.correlator.stats().recorded,
            n_ecm_failed: self.n_ecm_failed,
            min_latency: self.latency.map(|range| range.min),
            max_latency: self.latency.map(|range| range.max),
        }
    }

    /// Codec counters for the stream fed so far.
    pub fn codec_stats(&self) -> CodecStats {
        self.codec.stats()
    }

    /// Captured exchanges.
    pub fn history(&self) -> &EcmHistory {
        self.correlator.history()
    }

    /// The correlation state machine.
    pub fn correlator(&self) -> &EcmCorrelator {
        &self.correlator
    }

    /// Current configuration.
    pub fn config(&self) -> &CardConfig {
        &self.config
    }
}

impl<E: Environment> BcasCard for PseudoCard<E> {
    fn init(&mut self) -> Result<(), CardError> {
        // Validate first so a bad config leaves the card untouched.
        let init_status = self.config.init_status()?;

        self.codec = FrameCodec::new();
        self.correlator = EcmCorrelator::new(self.config.queue_capacity);
        self.n_ecm_failed = 0;
        self.latency = None;
        if init_status.is_some() {
            self.init_status = init_status;
        }

        info!(
            capacity = self.config.queue_capacity,
            init_status = self.init_status.is_some(),
            "pseudo card initialised"
        );
        Ok(())
    }

    fn get_init_status(&self) -> Result<InitStatus, CardError> {
        Self::get_init_status(self)
    }

    fn process_ecm(&mut self, request: &[u8]) -> Result<EcmResult, CardError> {
        Self::process_ecm(self, request)
    }

    fn get_status(&self) -> CardStatus {
        Self::get_status(self)
    }
}
