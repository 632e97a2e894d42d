//! Send Buffer / Backlog (C3): transmitted I-frames kept for retransmission.

use super::frame::FrameRequest;

/// Holds the most recently transmitted I-frame request for each send
/// sequence number, so REJ/SREJ/poll-final recovery can re-frame it
/// without asking the upper layer again.
///
/// Sized to the sequence modulus, not the window: slots are overwritten by
/// the next I-frame carrying the same modular sequence number, which is
/// safe because the window invariant (`V(S) - V(A) <= k <= modulo`)
/// guarantees a slot is never reused before it has been acknowledged.
#[derive(Debug, Clone)]
pub struct Backlog {
    slots: Vec<Option<FrameRequest>>,
}

impl Backlog {
    /// A backlog sized for sequence modulus `modulo`.
    pub fn new(modulo: u8) -> Self {
        Self {
            slots: vec![None; modulo as usize],
        }
    }

    /// Store `req` as the frame sent with sequence number `n_s`.
    pub fn insert(&mut self, n_s: u8, req: FrameRequest) {
        let idx = n_s as usize % self.slots.len();
        self.slots[idx] = Some(req);
    }

    /// Fetch the request that produced sequence number `n_s`, if still
    /// held.
    pub fn get(&self, n_s: u8) -> Option<&FrameRequest> {
        self.slots[n_s as usize % self.slots.len()].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ax25::address::Address;
    use crate::ax25::frame::FrameKind;

    #[test]
    fn stores_and_overwrites_by_modular_index() {
        let mut b = Backlog::new(8);
        let dest = Address::new("DEST", 0);
        let r = |p: u8| FrameRequest {
            dest,
            kind: FrameKind::I,
            poll: false,
            payload: Some(vec![p]),
            command: true,
        };
        b.insert(2, r(1));
        assert_eq!(b.get(2).unwrap().payload, Some(vec![1]));
        b.insert(10, r(2)); // 10 mod 8 == 2
        assert_eq!(b.get(2).unwrap().payload, Some(vec![2]));
    }
}
