//! Uplinker (C5): drains the outbound request queue, frames each request,
//! and publishes the bytes to the lower layer.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::warn;

use super::address::Address;
use super::frame::build_frame;
use super::state::{LinkState, TakeOutcome};
use super::timers::Timers;

const EMPTY_BACKOFF: Duration = Duration::from_millis(10);
const WINDOW_FULL_BACKOFF: Duration = Duration::from_millis(100);

/// Handle to the Uplinker worker thread.
pub struct Uplinker {
    handle: Option<JoinHandle<()>>,
}

impl Uplinker {
    /// Spawn the Uplinker loop for `link`.
    pub fn spawn(link: Arc<LinkState>, local: Address, timers: Arc<Timers>) -> Self {
        let handle = std::thread::spawn(move || Self::run(link, local, timers));
        Self {
            handle: Some(handle),
        }
    }

    /// Block until the worker thread exits (the link must already be
    /// shutting down).
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
            match link.try_take_next_to_send() {
                TakeOutcome::Empty => {
                    link.wait_while(EMPTY_BACKOFF, |g| g.outbound.is_empty());
                }
                TakeOutcome::WindowFull => {
                    std::thread::sleep(WINDOW_FULL_BACKOFF);
                }
                TakeOutcome::Send {
                    req,
                    n_s,
                    n_r,
                    modulo,
                    is_iframe,
                } => match build_frame(&req, &local, modulo, n_s, n_r) {
                    Some(bytes) => {
                        link.publish_frame(bytes);
                        if is_iframe {
                            timers.reset_t1();
                        }
                    }
                    None => warn!("Uplinker: framing failed for {:?}, dropping", req.kind),
                },
            }
        }
    }
}

impl Drop for Uplinker {
    fn drop(&mut self) {
        self.join();
    }
}
