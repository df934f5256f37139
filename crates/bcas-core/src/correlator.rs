//! ECM request/response correlation.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`EcmCorrelator::on_frame`] takes each decoded frame plus the current time
//! and returns the [`CorrelatorEvent`]s it caused. Nothing here performs I/O.
//! The card logs and counts the events, and tests assert on them directly.
//!
//! # State Machine
//!
//! ```text
//!             request                      response
//! ┌──────┐ ─────────────> ┌──────────────────┐ ─────────> record pushed
//! │ Idle │                │ AwaitingResponse │            ┌──────┐
//! └──────┘ <───────────── └──────────────────┘ ─────────> │ Idle │
//!           resync (drop)        │    ^                   └──────┘
//!                                └────┘ request (supersede)
//! ```
//!
//! There is no timeout. A stale pending request is only dropped by the next
//! resynchronisation or replaced by the next request.

use std::time::Instant;

use bcas_proto::{EcmResponse, Frame, FrameKind, ProtocolError};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::history::{EcmHistory, EcmRecord};

/// Correlator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelatorState {
    /// No request outstanding
    Idle,
    /// A request is waiting for its response
    AwaitingResponse,
}

/// The request currently waiting for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    body: Bytes,
}

impl PendingRequest {
    /// ECM body of the request.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Something the correlator did in response to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelatorEvent {
    /// Pending request dropped because the stream resynchronised.
    PendingDiscarded {
        /// Body of the dropped request
        body: Bytes,
    },

    /// A new request replaced one that never got its response.
    RequestSuperseded {
        /// Body of the replaced request
        body: Bytes,
        /// Frames seen since the replaced request
        frames: u64,
    },

    /// Response with no request outstanding.
    UnrequestedResponse {
        /// Flag the response carried
        flag: u16,
    },

    /// Response arrived more than one frame after its request.
    DelayedResponse {
        /// Frames seen since the request
        frames: u64,
    },

    /// A request/response pair was appended to the history.
    Recorded {
        /// The new record
        record: EcmRecord,
        /// Record evicted to make room
        evicted: Option<EcmRecord>,
    },

    /// Frame carried an ECM tag but not a valid ECM shape.
    Malformed(ProtocolError),
}

/// Running correlator counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrelatorStats {
    /// ECM requests accepted
    pub requests: u64,
    /// Records appended to the history
    pub recorded: u64,
    /// Requests replaced before their response
    pub superseded: u64,
    /// Responses seen with nothing pending
    pub unrequested: u64,
    /// Pending requests dropped on resync
    pub discarded: u64,
}

/// Pairs ECM requests with their responses into a bounded history.
#[derive(Debug, Clone, Default)]
pub struct EcmCorrelator {
    pending: Option<PendingRequest>,
    /// Frames seen since the last accepted request
    frames_since_request: u64,
    history: EcmHistory,
    stats: CorrelatorStats,
}

impl EcmCorrelator {
    /// Create an idle correlator keeping at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self { history: EcmHistory::new(capacity), ..Self::default() }
    }

    /// Feed one decoded frame.
    ///
    /// `first_after_sync` must be set for the first frame after the codec
    /// (re)acquired sync; `now` stamps any record this frame completes.
    pub fn on_frame(
        &mut self,
        frame: &Frame,
        first_after_sync: bool,
        now: Instant,
    ) -> Vec<CorrelatorEvent> {
        let mut events = Vec::new();

        if first_after_sync && let Some(pending) = self.pending.take() {
            warn!(body = %hex::encode(&pending.body), "pending request discarded due to resync");
            self.stats.discarded += 1;
            events.push(CorrelatorEvent::PendingDiscarded { body: pending.body });
        }

        self.frames_since_request += 1;

        match FrameKind::classify(frame) {
            Ok(FrameKind::EcmRequest(request)) => {
                if let Some(previous) = self.pending.take() {
                    let frames = self.frames_since_request;
                    warn!(frames, "ECM request superseded before its response");
                    self.stats.superseded += 1;
                    events.push(CorrelatorEvent::RequestSuperseded { body: previous.body, frames });
                }

                self.pending = Some(PendingRequest { body: request.into_body() });
                self.frames_since_request = 0;
                self.stats.requests += 1;
            },
            Ok(FrameKind::EcmResponse(response)) => {
                self.on_response(&response, now, &mut events);
            },
            Ok(FrameKind::Other) => {},
            Err(error) => {
                warn!(%error, marker = frame.marker(), "ECM-tagged frame ignored");
                events.push(CorrelatorEvent::Malformed(error));
            },
        }

        events
    }

    fn on_response(
        &mut self,
        response: &EcmResponse,
        now: Instant,
        events: &mut Vec<CorrelatorEvent>,
    ) {
        let Some(pending) = self.pending.take() else {
            warn!(flag = response.flag(), "unrequested ECM response");
            self.stats.unrequested += 1;
            events.push(CorrelatorEvent::UnrequestedResponse { flag: response.flag() });
            return;
        };

        let frames = self.frames_since_request;
        if frames > 1 {
            warn!(frames, "ECM response delayed");
            events.push(CorrelatorEvent::DelayedResponse { frames });
        }

        let record = EcmRecord::new(pending.body, response.flag(), *response.key(), now);
        debug!(
            body = %hex::encode(record.request_body()),
            flag = record.flag(),
            "ECM registered"
        );

        let evicted = self.history.push(record.clone());
        self.stats.recorded += 1;
        events.push(CorrelatorEvent::Recorded { record, evicted });
    }

    /// Current state.
    pub fn state(&self) -> CorrelatorState {
        if self.pending.is_some() {
            CorrelatorState::AwaitingResponse
        } else {
            CorrelatorState::Idle
        }
    }

    /// Request waiting for its response.
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Frames seen since the last accepted request.
    pub fn frames_since_request(&self) -> u64 {
        self.frames_since_request
    }

    /// Completed exchanges.
    pub fn history(&self) -> &EcmHistory {
        &self.history
    }

    /// Mutable access for capacity changes.
    pub fn history_mut(&mut self) -> &mut EcmHistory {
        &mut self.history
    }

    /// Running counters.
    pub fn stats(&self) -> CorrelatorStats {
        self.stats
    }
}
