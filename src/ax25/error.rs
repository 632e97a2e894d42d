//! Error taxonomy for the link-layer engine.

use thiserror::Error;

/// Errors the engine's components can raise.
///
/// Most of these are handled locally by the worker that raises them (see
/// the dispositions documented on each variant); only [`LinkError::RetryExhausted`]
/// is ever surfaced to the upper layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Flag missing, non-octet-aligned, zero length, a truncated field, or an
    /// unrecognized control-field encoding. Dropped silently; no state change.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The frame's destination address does not name the local station (or
    /// could not be decoded as one). Dropped silently.
    #[error("frame addressed to a different station")]
    WrongDestination,

    /// T1 fired more than the configured retry budget. Fatal: the Uplinker
    /// halts retransmission and the upper layer is notified.
    #[error("link retry budget exhausted after {0} attempts")]
    RetryExhausted(u32),
}
