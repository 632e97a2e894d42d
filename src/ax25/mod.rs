//! AX.25 v2.2 link-layer engine.
//!
//! This module tree is the connection-oriented, sequence-numbered,
//! acknowledged frame exchange described by the crate: framing and CRC
//! (`bits`, `crc`, `frame`), the bit-synchronized frame boundary extractor
//! (`bitstream`), per-link state and flow control (`state`, `backlog`,
//! `timers`), the worker loops that drive traffic (`uplink`, `downlink`),
//! and the facade that ties them together (`engine`).
//!
//! Everything here is byte-in/byte-out: no dependency on any particular
//! physical-layer or flowgraph framework, so it can be driven by a
//! KISS/TCP bridge, a radio flowgraph, or a test harness.

pub mod address;
pub mod backlog;
pub mod bits;
pub mod bitstream;
pub mod config;
pub mod crc;
pub mod downlink;
pub mod engine;
pub mod error;
pub mod frame;
pub mod queue;
pub mod state;
pub mod timers;
pub mod uplink;

pub use address::Address;
pub use config::LinkConfig;
pub use engine::Engine;
pub use error::LinkError;
pub use frame::{DecodedFrame, DecodedKind, FrameKind, FrameRequest};
