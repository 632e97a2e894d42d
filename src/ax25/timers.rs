//! Timers T1/T3 (C4): one-shot countdown timers whose expiration enqueues
//! supervisory control frames through the link's own lock.
//!
//! Per the design notes, the source's separate reset/cancel events are
//! consolidated here into a single component exposing `reset`/`cancel`
//! message inputs; it owns a dedicated worker thread and the one-shot
//! firing logic.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::state::LinkState;

/// Which timer a command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The acknowledgement-wait timer.
    T1,
    /// The link-integrity timer.
    T3,
}

enum Cmd {
    Reset(Kind),
    Cancel(Kind),
    Shutdown,
}

/// Handle to the timer worker for one link.
pub struct Timers {
    tx: mpsc::Sender<Cmd>,
    handle: Option<JoinHandle<()>>,
}

impl Timers {
    /// Spawn the timer worker for `link`.
    pub fn spawn(link: Arc<LinkState>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || Self::run(link, rx));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Cancel any running T1 and restart it with the configured duration.
    pub fn reset_t1(&self) {
        let _ = self.tx.send(Cmd::Reset(Kind::T1));
    }

    /// Cancel T1 without restarting it.
    pub fn cancel_t1(&self) {
        let _ = self.tx.send(Cmd::Cancel(Kind::T1));
    }

    /// Cancel any running T3 and restart it with the configured duration.
    pub fn reset_t3(&self) {
        let _ = self.tx.send(Cmd::Reset(Kind::T3));
    }

    /// Stop the worker thread. Idempotent.
    pub fn shutdown(&mut self) {
        let _ = self.tx.send(Cmd::Shutdown);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }

    fn run(link: Arc<LinkState>, rx: mpsc::Receiver<Cmd>) {
        let mut t1_deadline: Option<Instant> = None;
        let mut t3_deadline: Option<Instant> = None;
        loop {
            if link.is_shutdown() {
                return;
            }
            let now = Instant::now();
            let next_deadline = [t1_deadline, t3_deadline].into_iter().flatten().min();
            let wait = next_deadline
                .map(|d| d.saturating_duration_since(now))
                .unwrap_or(Duration::from_millis(100));

            match rx.recv_timeout(wait) {
                Ok(Cmd::Reset(Kind::T1)) => {
                    t1_deadline = Some(Instant::now() + link.config.ack_timer)
                }
                Ok(Cmd::Cancel(Kind::T1)) => t1_deadline = None,
                Ok(Cmd::Reset(Kind::T3)) => {
                    t3_deadline = Some(Instant::now() + link.config.timer_t3)
                }
                Ok(Cmd::Cancel(Kind::T3)) => t3_deadline = None,
                Ok(Cmd::Shutdown) => return,
                Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            if let Some(d) = t1_deadline
                && now >= d
            {
                match link.on_t1_expire() {
                    Ok(_req) => {
                        debug!("T1 expired, supervisory poll enqueued");
                        t1_deadline = Some(now + link.config.ack_timer);
                    }
                    Err(e) => {
                        warn!("T1 retry budget exhausted: {e}");
                        t1_deadline = None;
                    }
                }
            }
            if let Some(d) = t3_deadline
                && now >= d
            {
                let _req = link.on_t3_expire();
                debug!("T3 expired, link-integrity poll enqueued");
                t3_deadline = Some(now + link.config.timer_t3);
            }
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.shutdown();
    }
}
