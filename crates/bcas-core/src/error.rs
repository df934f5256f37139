//! Card error types.

use thiserror::Error;

/// Errors surfaced to callers of the pseudo card.
///
/// Stream problems (broken frames, unrequested responses, superseded
/// requests) are never reported here. The card recovers from them itself
/// and reports them through logging and [`crate::CorrelatorEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    /// No captured response matches the requested ECM body.
    #[error("no captured response for ECM body ({len} bytes)")]
    EcmNotFound {
        /// Length of the requested body
        len: usize,
    },

    /// Init status or configuration value could not be used.
    #[error("invalid {field}: {reason}")]
    InvalidFormat {
        /// Which value was rejected
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Init status requested before any was installed.
    #[error("card init status not set")]
    NotInitialized,
}
