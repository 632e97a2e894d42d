//! Downlinker / Dispatcher (C6): drains the inbound frame queue, deframes
//! each buffer, and routes it by decoded kind to the matching handler.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};

use super::address::Address;
use super::error::LinkError;
use super::frame::{self, DecodedKind, FrameKind};
use super::state::{LinkState, TimerSignal};
use super::timers::Timers;

const EMPTY_BACKOFF: Duration = Duration::from_millis(10);

/// Handle to the Downlinker worker thread.
pub struct Downlinker {
    handle: Option<JoinHandle<()>>,
}

impl Downlinker {
    /// Spawn the Downlinker loop for `link`.
    pub fn spawn(link: Arc<LinkState>, local: Address, timers: Arc<Timers>) -> Self {
        let handle = std::thread::spawn(move || Self::run(link, local, timers));
        Self {
            handle: Some(handle),
        }
    }

    /// Block until the worker thread exits.
    pub fn join(&mut self) {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }

    fn run(link: Arc<LinkState>, local: Address, timers: Arc<Timers>) {
        loop {
            if link.is_shutdown() {
                return;
            }
            let Some(raw) = link.pop_inbound() else {
                link.wait_while(EMPTY_BACKOFF, |g| g.inbound.is_empty());
                continue;
            };
            let vr = link.vr();
            match frame::parse_frame(&raw, &local, link.config.modulo, vr) {
                Ok(decoded) => Self::dispatch(&link, &timers, decoded),
                Err(LinkError::WrongDestination) => {
                    debug!("Downlinker: dropping frame not addressed to us")
                }
                Err(e) => debug!("Downlinker: dropping malformed frame: {e}"),
            }
        }
    }

    fn apply(timers: &Timers, signal: TimerSignal) {
        match signal {
            TimerSignal::None => {}
            TimerSignal::CancelT1 => timers.cancel_t1(),
            TimerSignal::ResetT1 => timers.reset_t1(),
        }
    }

    fn dispatch(link: &Arc<LinkState>, timers: &Timers, decoded: frame::DecodedFrame) {
        match decoded.kind {
            DecodedKind::Frame(FrameKind::I) => {
                let outcome = link.handle_i_frame(&decoded);
                Self::apply(timers, outcome.timer);
                if let Some(reply) = outcome.reply {
                    link.enqueue_reply(reply);
                }
            }
            DecodedKind::Recovery => {
                if let Some(reply) = link.handle_recovery(&decoded) {
                    link.enqueue_reply(reply);
                }
            }
            DecodedKind::Frame(FrameKind::REJ) => {
                let timer = link.handle_rej(&decoded);
                Self::apply(timers, timer);
            }
            DecodedKind::Frame(FrameKind::SREJ) => {
                let timer = link.handle_srej(&decoded);
                Self::apply(timers, timer);
            }
            DecodedKind::Frame(FrameKind::RR) => {
                let outcome = link.handle_rr(&decoded);
                Self::apply(timers, outcome.timer);
                if let Some(reply) = outcome.reply {
                    link.enqueue_reply(reply);
                }
            }
            DecodedKind::Frame(FrameKind::RNR) => {
                let outcome = link.handle_rnr(&decoded);
                Self::apply(timers, outcome.timer);
                if let Some(reply) = outcome.reply {
                    link.enqueue_reply(reply);
                }
            }
            // Link establishment/teardown (SABM(E)/DISC/DM/UA/FRMR) and
            // UI/XID/TEST are outside the data-transfer core this engine
            // implements.
            DecodedKind::Frame(other) => {
                warn!("Downlinker: no handler for {other:?}, dropping frame");
            }
        }
    }
}

impl Drop for Downlinker {
    fn drop(&mut self) {
        self.join();
    }
}
