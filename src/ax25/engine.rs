//! Engine facade (C8): owns one link instance and exposes payload-in,
//! frame-in, payload-out, and frame-out to the external flowgraph.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use super::bitstream::Extractor;
use super::config::LinkConfig;
use super::downlink::Downlinker;
use super::error::LinkError;
use super::state::LinkState;
use super::timers::Timers;
use super::uplink::Uplinker;

/// A running AX.25 link: one `LinkState` plus its Uplinker, Downlinker,
/// and Timer workers, started at construction.
pub struct Engine {
    link: Arc<LinkState>,
    extractor: Extractor,
    frame_out: Receiver<Vec<u8>>,
    payload_out: Receiver<Vec<u8>>,
    // Held so the shared Arc outlives Uplinker/Downlinker; dropping it last
    // is what lets Timers::drop's shutdown+join run exactly once.
    #[allow(dead_code)]
    timers: Arc<Timers>,
    uplinker: Uplinker,
    downlinker: Downlinker,
}

impl Engine {
    /// Build and start a link for `config`.
    pub fn new(config: LinkConfig) -> Self {
        let local = config.local;
        let (link, frame_out, payload_out) = LinkState::new(config);
        let timers = Arc::new(Timers::spawn(link.clone()));
        let uplinker = Uplinker::spawn(link.clone(), local, timers.clone());
        let downlinker = Downlinker::spawn(link.clone(), local, timers.clone());
        timers.reset_t3();
        Self {
            link,
            extractor: Extractor::new(8192),
            frame_out,
            payload_out,
            timers,
            uplinker,
            downlinker,
        }
    }

    /// Upper-layer payload in: enqueue `payload` as an outbound I-frame.
    pub fn send_payload(&self, payload: Vec<u8>) {
        self.link.enqueue_payload(payload);
    }

    /// Lower-layer frame in, already flag-delimited and destuffed (as
    /// [`bitstream::Extractor`] would produce upstream). Use this when an
    /// external extractor is already in the pipeline.
    pub fn receive_frame(&self, raw: Vec<u8>) {
        self.link.enqueue_inbound(raw);
    }

    /// Lower-layer frame in, raw octets straight off the channel. The
    /// Engine performs extraction itself, per the "if the extractor is not
    /// used upstream" fallback.
    pub fn receive_bytes(&mut self, data: &[u8]) {
        self.extractor.feed(data);
        while let Some(raw) = self.extractor.pop() {
            self.link.enqueue_inbound(raw);
        }
    }

    /// Pop one frame-out byte buffer (flag-delimited, ready for the
    /// channel), if one is ready.
    pub fn try_recv_frame_out(&self) -> Option<Vec<u8>> {
        match self.frame_out.try_recv() {
            Ok(v) => Some(v),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Pop one delivered payload, if one is ready.
    pub fn try_recv_payload(&self) -> Option<Vec<u8>> {
        match self.payload_out.try_recv() {
            Ok(v) => Some(v),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// The fatal error, if retry-exhaustion has made the link unusable.
    pub fn fatal(&self) -> Option<LinkError> {
        self.link.fatal()
    }

    /// Current `(V(S), V(R), V(A))`, for tests and introspection.
    pub fn sequence_state(&self) -> (u8, u8, u8) {
        self.link.snapshot()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.link.request_shutdown();
        self.uplinker.join();
        self.downlinker.join();
    }
}
