//! Link State Machine (C7): the per-link variables, guarded by one mutex,
//! plus the atomic compound operations the dispatcher and timers drive
//! through it.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::debug;

use super::backlog::Backlog;
use super::config::{LinkConfig, RejMode};
use super::error::LinkError;
use super::frame::{DecodedFrame, FrameKind, FrameRequest};
use super::queue::{InboundQueue, OutboundQueue};

/// Link connection state. Only `Conn` is required for the I-frame data
/// transfer this engine implements; `Disc`/`Busy` are exposed for
/// completeness (see the open question on link establishment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Disconnected.
    Disc,
    /// Connected, normal data transfer.
    Conn,
    /// Connected, but locally busy (can't accept more I-frames).
    Busy,
}

/// What a handler wants done with T1 after it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// No timer action.
    None,
    /// Cancel T1 (everything is acknowledged).
    CancelT1,
    /// Restart T1 (partial acknowledgement, or a forced reset).
    ResetT1,
}

/// Mutable state guarded by [`LinkState`]'s single mutex.
pub struct LinkInner {
    /// V(S): next send sequence number to originate.
    pub vs: u8,
    /// V(R): next in-order N(S) expected.
    pub vr: u8,
    /// V(A): lowest unacknowledged send sequence.
    pub va: u8,
    /// Connection state.
    pub conn_state: ConnState,
    /// True while awaiting recovery of a detected sequence break.
    pub rej_active: bool,
    /// N(S) observed when the current break was first detected.
    pub ns_before_seqbreak: u8,
    /// True while the peer has signalled RNR.
    pub remote_busy: bool,
    /// Consecutive T1 expirations pending a final-bit response.
    pub t1_try_count: u32,
    /// Transmitted I-frames, indexed by N(S), for retransmission.
    pub backlog: Backlog,
    /// Outbound request queue.
    pub outbound: OutboundQueue,
    /// Inbound raw-frame queue.
    pub inbound: InboundQueue,
    /// Set once retry-exhaustion has made the link unusable.
    pub fatal: Option<LinkError>,
    /// Cooperative shutdown flag checked by all workers.
    pub shutdown: bool,
}

impl LinkInner {
    fn new(modulo: u8) -> Self {
        Self {
            vs: 0,
            vr: 0,
            va: 0,
            conn_state: ConnState::Conn,
            rej_active: false,
            ns_before_seqbreak: 0,
            remote_busy: false,
            t1_try_count: 0,
            backlog: Backlog::new(modulo),
            outbound: OutboundQueue::new(),
            inbound: InboundQueue::new(),
            fatal: None,
            shutdown: false,
        }
    }
}

/// What the Uplinker should do with the head of the outbound queue.
#[derive(Debug)]
pub enum TakeOutcome {
    /// Nothing queued.
    Empty,
    /// An I-frame was at the head but the peer's window is full; it has
    /// been put back.
    WindowFull,
    /// Send this request, stamped with the given sequence numbers.
    Send {
        /// The request to frame and send.
        req: FrameRequest,
        /// N(S) to stamp (only meaningful when `is_iframe`).
        n_s: u8,
        /// N(R) to stamp.
        n_r: u8,
        /// Sequence modulus in effect.
        modulo: u8,
        /// Whether this is an I-frame (and so advanced V(S)/backlog).
        is_iframe: bool,
    },
}

/// Outcome of an RR/RNR supervisory receipt (C6 §RR/RNR-handler).
pub struct SupervisoryOutcome {
    /// What to do with T1.
    pub timer: TimerSignal,
    /// A supervisory frame to send back, if the peer was polling us.
    pub reply: Option<FrameRequest>,
}

/// Outcome of processing an inbound I-frame (C6 §I-handler).
pub struct IFrameOutcome {
    /// Payload to deliver upward, if this was an in-sequence new frame.
    pub deliver: Option<Vec<u8>>,
    /// What to do with T1.
    pub timer: TimerSignal,
    /// A supervisory frame to send back, if warranted.
    pub reply: Option<FrameRequest>,
}

/// Add `b` to `a` modulo `modulo`.
pub fn add_mod(a: u8, b: u8, modulo: u8) -> u8 {
    (((a as u16) + (b as u16)) % modulo as u16) as u8
}

/// Subtract `b` from `a` modulo `modulo`.
pub fn sub_mod(a: u8, b: u8, modulo: u8) -> u8 {
    (((a as i16) - (b as i16)).rem_euclid(modulo as i16)) as u8
}

/// The per-link state machine: variables, queues, and backlog behind one
/// mutex, plus the compound operations that must be atomic against other
/// link operations.
pub struct LinkState {
    /// Immutable for the link's lifetime; no locking needed.
    pub config: LinkConfig,
    inner: Mutex<LinkInner>,
    cv: Condvar,
    frame_out: mpsc::Sender<Vec<u8>>,
    payload_out: mpsc::Sender<Vec<u8>>,
}

impl LinkState {
    /// Build a new link state, returning it plus the two external sinks
    /// (framed bytes to transmit, and payload delivered to the upper
    /// layer) the Engine facade reads from.
    pub fn new(
        config: LinkConfig,
    ) -> (Arc<Self>, mpsc::Receiver<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        let modulo = config.modulo;
        let (frame_out, frame_out_rx) = mpsc::channel();
        let (payload_out, payload_out_rx) = mpsc::channel();
        let state = Arc::new(Self {
            config,
            inner: Mutex::new(LinkInner::new(modulo)),
            cv: Condvar::new(),
            frame_out,
            payload_out,
        });
        (state, frame_out_rx, payload_out_rx)
    }

    fn lock(&self) -> MutexGuard<'_, LinkInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wake any worker blocked waiting on the link's condition variable.
    pub fn notify(&self) {
        self.cv.notify_all();
    }

    /// Block the calling worker until `predicate` holds or `timeout`
    /// elapses, or the link is shut down.
    pub fn wait_while(
        &self,
        timeout: std::time::Duration,
        mut predicate: impl FnMut(&LinkInner) -> bool,
    ) {
        let guard = self.lock();
        if guard.shutdown {
            return;
        }
        let _ = self
            .cv
            .wait_timeout_while(guard, timeout, |g| !g.shutdown && predicate(g));
    }

    /// `true` once [`LinkState::request_shutdown`] has been called.
    pub fn is_shutdown(&self) -> bool {
        self.lock().shutdown
    }

    /// Ask all workers to stop at their next loop iteration.
    pub fn request_shutdown(&self) {
        self.lock().shutdown = true;
        self.notify();
    }

    /// The fatal error, if retry-exhaustion has occurred.
    pub fn fatal(&self) -> Option<LinkError> {
        self.lock().fatal.clone()
    }

    /// Publish a fully-framed byte buffer to the lower layer.
    pub fn publish_frame(&self, bytes: Vec<u8>) {
        let _ = self.frame_out.send(bytes);
    }

    /// Deliver a payload to the upper layer.
    fn deliver_payload(&self, payload: Vec<u8>) {
        let _ = self.payload_out.send(payload);
    }

    /// Enqueue a payload as an outbound I-frame request (upper-layer
    /// payload-in).
    pub fn enqueue_payload(&self, payload: Vec<u8>) {
        let req = FrameRequest {
            dest: self.config.remote,
            kind: FrameKind::I,
            poll: false,
            payload: Some(payload),
            command: true,
        };
        let mut g = self.lock();
        g.outbound.push_back(req);
        drop(g);
        self.notify();
    }

    /// Enqueue a raw, flag-delimited frame buffer (lower-layer frame-in).
    pub fn enqueue_inbound(&self, raw: Vec<u8>) {
        let mut g = self.lock();
        g.inbound.push_back(raw);
        drop(g);
        self.notify();
    }

    /// Pop one raw inbound frame for the Downlinker, if any.
    pub fn pop_inbound(&self) -> Option<Vec<u8>> {
        self.lock().inbound.pop_front()
    }

    /// `true` if the outbound queue is empty.
    pub fn outbound_empty(&self) -> bool {
        self.lock().outbound.is_empty()
    }

    /// Current V(R), needed by the Downlinker to classify inbound I-frames.
    pub fn vr(&self) -> u8 {
        self.lock().vr
    }

    /// What the Uplinker should do about the head of the outbound queue.
    pub fn try_take_next_to_send(&self) -> TakeOutcome {
        let mut g = self.lock();
        let Some(req) = g.outbound.pop_front() else {
            return TakeOutcome::Empty;
        };
        let modulo = self.config.modulo;
        if matches!(req.kind, FrameKind::I) {
            if g.vs == add_mod(g.va, self.config.receive_window_k, modulo) {
                // Window full (P4/S6): put it back and let the caller back off.
                g.outbound.push_front(req);
                return TakeOutcome::WindowFull;
            }
            let n_s = g.vs;
            let n_r = g.vr;
            // Open question #2: write backlog first, then advance V(S), so a
            // concurrent reader seeing the new V(S) also sees the slot filled.
            g.backlog.insert(n_s, req.clone());
            g.vs = add_mod(g.vs, 1, modulo);
            TakeOutcome::Send {
                req,
                n_s,
                n_r,
                modulo,
                is_iframe: true,
            }
        } else {
            let n_r = g.vr;
            TakeOutcome::Send {
                req,
                n_s: 0,
                n_r,
                modulo,
                is_iframe: false,
            }
        }
    }

    fn ack(&self, g: &mut LinkInner, n_r: u8) -> TimerSignal {
        let signal = if n_r == g.va {
            TimerSignal::None
        } else if n_r == g.vs {
            TimerSignal::CancelT1
        } else {
            TimerSignal::ResetT1
        };
        g.va = n_r;
        signal
    }

    /// C6 §I-handler.
    pub fn handle_i_frame(&self, decoded: &DecodedFrame) -> IFrameOutcome {
        let mut g = self.lock();
        let modulo = self.config.modulo;

        let timer = if decoded.poll {
            TimerSignal::None
        } else {
            self.ack(&mut g, decoded.n_r)
        };

        let payload = decoded
            .info
            .as_ref()
            .and_then(|pid_info| pid_info.get(1..))
            .map(|p| p.to_vec());
        g.vr = add_mod(g.vr, 1, modulo);

        if g.rej_active
            && let Some(ns) = decoded.n_s
        {
            let cleared = match self.config.rej {
                RejMode::Rej | RejMode::Srej => ns == sub_mod(g.ns_before_seqbreak, 1, modulo),
            };
            if cleared {
                g.rej_active = false;
            }
        }

        let window_full = g.vs == add_mod(g.va, self.config.receive_window_k, modulo);
        let reply = if g.outbound.is_empty() || window_full {
            let kind = if g.conn_state == ConnState::Busy {
                FrameKind::RNR
            } else {
                FrameKind::RR
            };
            Some(FrameRequest {
                dest: self.config.remote,
                kind,
                poll: decoded.poll,
                payload: None,
                command: !decoded.poll,
            })
        } else {
            None
        };

        let vr_now = g.vr;
        drop(g);
        if let Some(payload) = payload.clone() {
            debug!("delivering payload, V(R) now {vr_now}");
            self.deliver_payload(payload);
        }
        self.notify();
        IFrameOutcome {
            deliver: payload,
            timer,
            reply,
        }
    }

    /// C6 §RECOVERY-handler.
    pub fn handle_recovery(&self, decoded: &DecodedFrame) -> Option<FrameRequest> {
        let mut g = self.lock();
        let ns = decoded.n_s.unwrap_or(g.vr);

        if g.rej_active && decoded.poll {
            let kind = match self.config.rej {
                RejMode::Rej => FrameKind::REJ,
                RejMode::Srej => FrameKind::SREJ,
            };
            return Some(FrameRequest {
                dest: self.config.remote,
                kind,
                poll: true,
                payload: None,
                command: true,
            });
        }

        if !g.rej_active {
            g.ns_before_seqbreak = ns;
            g.rej_active = true;
            let kind = match self.config.rej {
                RejMode::Rej => FrameKind::REJ,
                RejMode::Srej => FrameKind::SREJ,
            };
            return Some(FrameRequest {
                dest: self.config.remote,
                kind,
                poll: decoded.poll,
                payload: None,
                command: true,
            });
        }
        None
    }

    /// C6 §REJ-handler.
    pub fn handle_rej(&self, decoded: &DecodedFrame) -> TimerSignal {
        let mut g = self.lock();
        let timer = self.ack(&mut g, decoded.n_r);
        g.remote_busy = false;
        let modulo = self.config.modulo;
        let prev_vs = g.vs;
        let n_r = decoded.n_r;
        g.vs = n_r;
        let count = sub_mod(prev_vs, n_r, modulo);
        let mut reqs = Vec::new();
        for i in 0..count {
            let seq = add_mod(n_r, i, modulo);
            if let Some(req) = g.backlog.get(seq) {
                reqs.push(req.clone());
            }
        }
        g.outbound.requeue_front_in_order(reqs);
        drop(g);
        self.notify();
        timer
    }

    /// C6 §SREJ-handler. Always resets T1.
    pub fn handle_srej(&self, decoded: &DecodedFrame) -> TimerSignal {
        let mut g = self.lock();
        self.ack(&mut g, decoded.n_r);
        g.remote_busy = false;
        if let Some(req) = g.backlog.get(decoded.n_r) {
            let req = req.clone();
            g.outbound.push_front(req);
        }
        drop(g);
        self.notify();
        TimerSignal::ResetT1
    }

    fn handle_rr_or_rnr(&self, decoded: &DecodedFrame, is_rnr: bool) -> SupervisoryOutcome {
        let mut g = self.lock();
        g.remote_busy = is_rnr;
        let mut timer = self.ack(&mut g, decoded.n_r);
        if is_rnr && timer == TimerSignal::ResetT1 {
            // "does not restart the normal ack timer" while the peer is busy.
            timer = TimerSignal::None;
        }

        let mut reply = None;
        if decoded.poll && g.t1_try_count == 0 {
            let kind = if g.conn_state == ConnState::Busy {
                FrameKind::RNR
            } else {
                FrameKind::RR
            };
            reply = Some(FrameRequest {
                dest: self.config.remote,
                kind,
                poll: true,
                payload: None,
                command: false,
            });
        } else if decoded.poll && g.t1_try_count > 0 {
            g.t1_try_count = 0;
            if g.va != g.vs {
                let modulo = self.config.modulo;
                let prev_vs = g.vs;
                let n_r = decoded.n_r;
                g.vs = n_r;
                let count = sub_mod(prev_vs, n_r, modulo);
                let mut reqs = Vec::new();
                for i in 0..count {
                    let seq = add_mod(n_r, i, modulo);
                    if let Some(req) = g.backlog.get(seq) {
                        reqs.push(req.clone());
                    }
                }
                g.outbound.requeue_front_in_order(reqs);
            }
        }
        drop(g);
        self.notify();
        SupervisoryOutcome { timer, reply }
    }

    /// C6 §RR-handler.
    pub fn handle_rr(&self, decoded: &DecodedFrame) -> SupervisoryOutcome {
        self.handle_rr_or_rnr(decoded, false)
    }

    /// C6 §RNR-handler.
    pub fn handle_rnr(&self, decoded: &DecodedFrame) -> SupervisoryOutcome {
        self.handle_rr_or_rnr(decoded, true)
    }

    /// C4 §T1 expiration: enqueue a supervisory poll, bump the retry
    /// count, and report whether the retry budget is exhausted.
    pub fn on_t1_expire(&self) -> Result<FrameRequest, LinkError> {
        let mut g = self.lock();
        g.t1_try_count += 1;
        if g.t1_try_count > self.config.retries {
            let err = LinkError::RetryExhausted(g.t1_try_count);
            g.fatal = Some(err.clone());
            drop(g);
            self.notify();
            return Err(err);
        }
        let kind = if g.conn_state == ConnState::Busy {
            FrameKind::RNR
        } else {
            FrameKind::RR
        };
        let req = FrameRequest {
            dest: self.config.remote,
            kind,
            poll: true,
            payload: None,
            command: true,
        };
        g.outbound.push_front(req.clone());
        drop(g);
        self.notify();
        Ok(req)
    }

    /// C4 §T3 expiration: an RR-poll link-integrity check.
    pub fn on_t3_expire(&self) -> FrameRequest {
        let mut g = self.lock();
        let req = FrameRequest {
            dest: self.config.remote,
            kind: FrameKind::RR,
            poll: true,
            payload: None,
            command: true,
        };
        g.outbound.push_front(req.clone());
        drop(g);
        self.notify();
        req
    }

    /// Enqueue a handler-produced reply frame (RR/RNR/REJ/SREJ response).
    pub fn enqueue_reply(&self, req: FrameRequest) {
        let mut g = self.lock();
        g.outbound.push_back(req);
        drop(g);
        self.notify();
    }

    /// Snapshot the sequence variables, for tests and introspection.
    pub fn snapshot(&self) -> (u8, u8, u8) {
        let g = self.lock();
        (g.vs, g.vr, g.va)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::address::Address;
    use crate::ax25::config::LinkConfig;
    use crate::ax25::frame::DecodedKind;

    #[test]
    fn mod_arithmetic() {
        assert_eq!(add_mod(6, 3, 8), 1);
        assert_eq!(sub_mod(1, 3, 8), 6);
        assert_eq!(add_mod(127, 2, 128), 1);
    }

    fn link() -> (
        Arc<LinkState>,
        mpsc::Receiver<Vec<u8>>,
        mpsc::Receiver<Vec<u8>>,
    ) {
        let local = Address::new("N0CALL", 0);
        let remote = Address::new("N1CALL", 0);
        LinkState::new(LinkConfig::new(local, remote))
    }

    /// Send `n` payloads and immediately take them for transmission, so
    /// V(S) advances and the backlog fills without anything being acked.
    /// This is how S3/S4/S6 set up their starting V(A)=0, V(S)=n state.
    fn send_and_take(link: &LinkState, payloads: &[Vec<u8>]) {
        for p in payloads {
            link.enqueue_payload(p.clone());
            match link.try_take_next_to_send() {
                TakeOutcome::Send {
                    is_iframe: true, ..
                } => {}
                other => panic!("expected Send{{is_iframe: true}}, got {other:?}"),
            }
        }
    }

    fn rr_like(kind: FrameKind, n_r: u8, poll: bool) -> DecodedFrame {
        DecodedFrame {
            kind: DecodedKind::Frame(kind),
            poll,
            info: None,
            n_r,
            n_s: None,
            command: true,
        }
    }

    /// S3 — REJ recovery: V(A)=0, V(S)=4, backlog holds f0..f3. A REJ with
    /// N(R)=2 must rewind V(S) to 2 and requeue backlog[2], backlog[3] at
    /// the head of the outbound queue, in that order.
    #[test]
    fn s3_rej_recovery() {
        let (link, _frame_out, _payload_out) = link();
        let payloads: Vec<Vec<u8>> = (0..4).map(|i| vec![i]).collect();
        send_and_take(&link, &payloads);
        assert_eq!(link.snapshot(), (4, 0, 0));

        link.handle_rej(&rr_like(FrameKind::REJ, 2, false));
        assert_eq!(link.snapshot().0, 2);

        let mut g = link.lock();
        assert_eq!(g.outbound.pop_front().unwrap().payload, Some(vec![2]));
        assert_eq!(g.outbound.pop_front().unwrap().payload, Some(vec![3]));
        assert!(g.outbound.pop_front().is_none());
    }

    /// S4 — SREJ recovery: only the single named frame is requeued, V(S)
    /// is left unchanged, and T1 is always reset.
    #[test]
    fn s4_srej_recovery() {
        let (link, _frame_out, _payload_out) = link();
        let payloads: Vec<Vec<u8>> = (0..4).map(|i| vec![i]).collect();
        send_and_take(&link, &payloads);

        let timer = link.handle_srej(&rr_like(FrameKind::SREJ, 2, false));
        assert_eq!(timer, TimerSignal::ResetT1);
        assert_eq!(link.snapshot().0, 4);

        let mut g = link.lock();
        assert_eq!(g.outbound.pop_front().unwrap().payload, Some(vec![2]));
        assert!(g.outbound.pop_front().is_none());
    }

    /// S5 — T1 expiration: an RR poll is pushed, the retry count
    /// increments, and the budget is respected.
    #[test]
    fn s5_t1_expiration() {
        let (link, _frame_out, _payload_out) = link();
        let req = link.on_t1_expire().expect("within retry budget");
        assert_eq!(req.kind, FrameKind::RR);
        assert!(req.poll);
        assert_eq!(link.lock().t1_try_count, 1);

        for _ in 0..link.config.retries {
            let _ = link.on_t1_expire();
        }
        assert!(matches!(
            link.on_t1_expire(),
            Err(LinkError::RetryExhausted(_))
        ));
        assert!(link.fatal().is_some());
    }

    /// S6 — window full: at V(A)=0, V(S)=k=7, a new I-frame must not be
    /// sent and stays at the head of the outbound queue.
    #[test]
    fn s6_window_full() {
        let (link, _frame_out, _payload_out) = link();
        let k = link.config.receive_window_k;
        let payloads: Vec<Vec<u8>> = (0..k).map(|i| vec![i]).collect();
        send_and_take(&link, &payloads);
        assert_eq!(link.snapshot(), (k, 0, 0));

        link.enqueue_payload(vec![99]);
        assert!(matches!(
            link.try_take_next_to_send(),
            TakeOutcome::WindowFull
        ));
        // Still at the head: popping again gives the same frame back.
        match link.try_take_next_to_send() {
            TakeOutcome::WindowFull => {}
            other => panic!("expected WindowFull again, got {other:?}"),
        }
    }

    /// An inbound I-frame must still get an explicit supervisory reply when
    /// the outbound queue is non-empty but the peer's window is full, since
    /// nothing queued can piggyback the ack in that state.
    #[test]
    fn i_frame_acks_even_when_outbound_nonempty_and_window_full() {
        let (link, _frame_out, _payload_out) = link();
        let k = link.config.receive_window_k;
        let payloads: Vec<Vec<u8>> = (0..k).map(|i| vec![i]).collect();
        send_and_take(&link, &payloads);
        assert_eq!(link.snapshot(), (k, 0, 0));

        // Queued but unsendable: window is full, so outbound stays non-empty.
        link.enqueue_payload(vec![99]);
        assert!(!link.lock().outbound.is_empty());

        let decoded = DecodedFrame {
            kind: DecodedKind::Frame(FrameKind::I),
            poll: false,
            info: Some(vec![0xf0, 0xcc]),
            n_r: 0,
            n_s: Some(0),
            command: true,
        };
        let outcome = link.handle_i_frame(&decoded);
        assert!(outcome.reply.is_some());
    }

    /// P3/P4 — across a sequence of acks, V(A) advances monotonically and
    /// never passes V(S); the window bound holds after each ack.
    #[test]
    fn p3_p4_ack_monotonicity_and_window_bound() {
        let (link, _frame_out, _payload_out) = link();
        let payloads: Vec<Vec<u8>> = (0..5).map(|i| vec![i]).collect();
        send_and_take(&link, &payloads);

        let mut prev_va = 0u8;
        for n_r in [2u8, 3, 5] {
            link.handle_rr(&rr_like(FrameKind::RR, n_r, false));
            let (vs, _vr, va) = link.snapshot();
            assert!(
                va >= prev_va,
                "V(A) must not go backwards: {prev_va} -> {va}"
            );
            assert!(va <= vs, "V(A) must never pass V(S)");
            let modulo = link.config.modulo as i16;
            assert!(
                ((vs as i16 - va as i16).rem_euclid(modulo) as u8) <= link.config.receive_window_k
            );
            prev_va = va;
        }
    }

    /// P5 — every unacknowledged I-frame's backlog slot holds the request
    /// that produced it.
    #[test]
    fn p5_backlog_integrity() {
        let (link, _frame_out, _payload_out) = link();
        let payloads: Vec<Vec<u8>> = (0..4).map(|i| vec![10 + i]).collect();
        send_and_take(&link, &payloads);
        let g = link.lock();
        for (n_s, p) in payloads.iter().enumerate() {
            assert_eq!(g.backlog.get(n_s as u8).unwrap().payload, Some(p.clone()));
        }
    }

    /// P7 — receiving the same in-order I-frame twice must not advance
    /// V(R) twice; the duplicate is a sequence break, not a delivery.
    #[test]
    fn p7_idempotent_rereception() {
        let (link, _frame_out, payload_out) = link();
        let decoded = DecodedFrame {
            kind: DecodedKind::Frame(FrameKind::I),
            poll: false,
            info: Some(vec![0xf0, 0xaa]),
            n_r: 0,
            n_s: Some(0),
            command: true,
        };
        let outcome = link.handle_i_frame(&decoded);
        assert_eq!(outcome.deliver, Some(vec![0xaa]));
        assert_eq!(link.vr(), 1);
        assert_eq!(payload_out.try_recv().unwrap(), vec![0xaa]);

        // Same frame again: V(R) is now 1, so N(S)=0 is a sequence break.
        let reply = link.handle_recovery(&decoded);
        assert!(reply.is_some());
        assert_eq!(link.vr(), 1);
        assert!(payload_out.try_recv().is_err());
    }

    /// Gap-filling retransmission clears `rej_active` under the default
    /// SREJ mode, the same way it does under REJ: the frame that fills a
    /// single-frame gap always arrives with `N(S) == ns_before_seqbreak - 1`
    /// regardless of REJ/SREJ, since `handle_i_frame` is only ever called
    /// for an in-sequence `N(S)`.
    #[test]
    fn srej_gap_fill_clears_rej_active() {
        let (link, _frame_out, _payload_out) = link();
        assert_eq!(link.config.rej, RejMode::Srej);

        // Out-of-order arrival at N(S)=1 while V(R)=0 is a sequence break.
        let skip_ahead = DecodedFrame {
            kind: DecodedKind::Recovery,
            poll: false,
            info: Some(vec![0xf0, 0xbb]),
            n_r: 0,
            n_s: Some(1),
            command: true,
        };
        let reply = link.handle_recovery(&skip_ahead);
        assert!(reply.is_some());
        assert!(link.lock().rej_active);
        assert_eq!(link.lock().ns_before_seqbreak, 1);

        // The gap-filling retransmission: N(S)=0, matching current V(R).
        let gap_fill = DecodedFrame {
            kind: DecodedKind::Frame(FrameKind::I),
            poll: false,
            info: Some(vec![0xf0, 0xaa]),
            n_r: 0,
            n_s: Some(0),
            command: true,
        };
        link.handle_i_frame(&gap_fill);
        assert!(!link.lock().rej_active);
    }
}
