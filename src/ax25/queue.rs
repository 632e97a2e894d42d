//! Plain FIFO queues for outbound requests and inbound raw frames.
//!
//! A single link-wide mutex guards these queues together with the
//! sequence-number state, so both are plain `VecDeque`s living inside
//! [`state::LinkInner`](super::state::LinkInner) and are only ever
//! touched while that lock is held.

use std::collections::VecDeque;

use super::frame::FrameRequest;

/// The outbound request queue the Uplinker drains.
#[derive(Debug, Default)]
pub struct OutboundQueue(VecDeque<FrameRequest>);

impl OutboundQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    /// Enqueue at the tail (normal send order).
    pub fn push_back(&mut self, req: FrameRequest) {
        self.0.push_back(req);
    }

    /// Enqueue at the head (window-full re-queue, supervisory polls, T1/T3
    /// retransmission).
    pub fn push_front(&mut self, req: FrameRequest) {
        self.0.push_front(req);
    }

    /// Insert `reqs` at the head, in order, ahead of anything already
    /// queued — used by REJ/poll-final backlog rewind (P6).
    pub fn requeue_front_in_order(&mut self, reqs: Vec<FrameRequest>) {
        for req in reqs.into_iter().rev() {
            self.0.push_front(req);
        }
    }

    /// Remove and return the head request.
    pub fn pop_front(&mut self) -> Option<FrameRequest> {
        self.0.pop_front()
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The inbound raw-frame queue the Downlinker drains.
#[derive(Debug, Default)]
pub struct InboundQueue(VecDeque<Vec<u8>>);

impl InboundQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self(VecDeque::new())
    }

    /// Enqueue a raw, flag-delimited, destuffed frame buffer.
    pub fn push_back(&mut self, raw: Vec<u8>) {
        self.0.push_back(raw);
    }

    /// Remove and return the head frame buffer.
    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        self.0.pop_front()
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::address::Address;
    use crate::ax25::frame::FrameKind;

    fn req(poll: bool) -> FrameRequest {
        FrameRequest {
            dest: Address::new("DEST", 0),
            kind: FrameKind::RR,
            poll,
            payload: None,
            command: true,
        }
    }

    #[test]
    fn requeue_front_preserves_order() {
        let mut q = OutboundQueue::new();
        q.push_back(req(false));
        q.requeue_front_in_order(vec![req(true), req(true)]);
        // The two requeued (poll=true) items come first, in order, then
        // the original (poll=false) item.
        assert!(q.pop_front().unwrap().poll);
        assert!(q.pop_front().unwrap().poll);
        assert!(!q.pop_front().unwrap().poll);
        assert!(q.pop_front().is_none());
    }
}
