//! Frame build and parse: C2 of the link-layer engine.
//!
//! `build_frame` turns a [`FrameRequest`] plus the sender's sequence state
//! into the exact bytes to put on the wire (flags included, bit-stuffed,
//! bit-mirrored). `parse_frame` is the inverse, given a flag-delimited,
//! already-destuffed byte buffer as produced by
//! [`bitstream::Extractor`](crate::ax25::bitstream::Extractor).

use log::warn;

use super::address::Address;
use super::bits::{self, FLAG, FLAG_BITS};
use super::crc;
use super::error::LinkError;

/// PID value meaning "no layer-3 protocol", used on I- and UI-frames.
pub const PID_NO_L3: u8 = 0xf0;

/// The frame kinds an upper layer (or a handler) can ask the Uplinker to
/// send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Information frame, carries a payload.
    I,
    /// Receive Ready.
    RR,
    /// Receive Not Ready (busy).
    RNR,
    /// Reject (go-back-N recovery).
    REJ,
    /// Selective Reject.
    SREJ,
    /// Set Asynchronous Balanced Mode (modulo 8).
    SABM,
    /// Set Asynchronous Balanced Mode Extended (modulo 128).
    SABME,
    /// Disconnect.
    DISC,
    /// Disconnected Mode.
    DM,
    /// Unnumbered Acknowledge.
    UA,
    /// Frame Reject.
    FRMR,
    /// Unnumbered Information, carries a payload without sequencing.
    UI,
    /// Exchange Identification.
    XID,
    /// Test.
    TEST,
}

/// The kind of a successfully decoded inbound frame. `Recovery` is the
/// "sequence break" classification: a structurally valid I-frame whose
/// `N(S)` did not match the expected `V(R)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedKind {
    /// A well-formed, known frame kind.
    Frame(FrameKind),
    /// A valid I-frame received out of sequence.
    Recovery,
}

/// Outbound intent: what to send, not yet stamped with sequence numbers.
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// Destination station.
    pub dest: Address,
    /// Frame kind to send.
    pub kind: FrameKind,
    /// Poll/Final bit.
    pub poll: bool,
    /// Payload, for I- and UI-frames.
    pub payload: Option<Vec<u8>>,
    /// `true` for a command frame, `false` for a response.
    pub command: bool,
}

/// A successfully decoded inbound frame.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Decoded kind, or `Recovery` for an out-of-sequence I-frame.
    pub kind: DecodedKind,
    /// Poll/Final bit.
    pub poll: bool,
    /// PID+Info bytes, present for I-, Recovery-, and UI-frames.
    pub info: Option<Vec<u8>>,
    /// The peer's acknowledgement of our send sequence.
    pub n_r: u8,
    /// The frame's own send sequence number (I-frames and Recovery only).
    pub n_s: Option<u8>,
    /// `true` if this was a command frame, `false` if a response.
    pub command: bool,
}

fn u_frame_bits(kind: FrameKind) -> Option<(u8, u8)> {
    Some(match kind {
        FrameKind::SABME => (0b011, 0b1111),
        FrameKind::SABM => (0b001, 0b1111),
        FrameKind::DISC => (0b010, 0b0011),
        FrameKind::DM => (0b000, 0b1111),
        FrameKind::UA => (0b011, 0b0011),
        FrameKind::UI => (0b000, 0b0011),
        FrameKind::XID => (0b101, 0b1111),
        FrameKind::TEST => (0b111, 0b0011),
        FrameKind::FRMR => (0b100, 0b0111),
        _ => return None,
    })
}

fn u_frame_kind(high3: u8, low4: u8) -> Option<FrameKind> {
    Some(match (high3, low4) {
        (0b011, 0b1111) => FrameKind::SABME,
        (0b001, 0b1111) => FrameKind::SABM,
        (0b010, 0b0011) => FrameKind::DISC,
        (0b000, 0b1111) => FrameKind::DM,
        (0b011, 0b0011) => FrameKind::UA,
        (0b000, 0b0011) => FrameKind::UI,
        (0b101, 0b1111) => FrameKind::XID,
        (0b111, 0b0011) => FrameKind::TEST,
        (0b100, 0b0111) => FrameKind::FRMR,
        _ => return None,
    })
}

fn s_frame_ss(kind: FrameKind) -> Option<u8> {
    Some(match kind {
        FrameKind::RR => 0b00,
        FrameKind::RNR => 0b01,
        FrameKind::REJ => 0b10,
        FrameKind::SREJ => 0b11,
        _ => return None,
    })
}

fn s_frame_kind(ss: u8) -> Option<FrameKind> {
    Some(match ss {
        0b00 => FrameKind::RR,
        0b01 => FrameKind::RNR,
        0b10 => FrameKind::REJ,
        0b11 => FrameKind::SREJ,
        _ => return None,
    })
}

/// Build the on-wire bytes for `req`, stamping in the given sequence
/// numbers. Returns `None` on a framing failure (unsupported `modulo`, or a
/// request for a kind this builder does not know) — the caller logs and
/// drops the request, per the framing-failure disposition.
pub fn build_frame(
    req: &FrameRequest,
    src: &Address,
    modulo: u8,
    n_s: u8,
    n_r: u8,
) -> Option<Vec<u8>> {
    if modulo != 8 && modulo != 128 {
        warn!("build_frame: unsupported modulo {modulo}");
        return None;
    }

    let mut body = Vec::new();
    body.extend_from_slice(&req.dest.encode(req.command, false));
    body.extend_from_slice(&src.encode(!req.command, true));

    match req.kind {
        FrameKind::I => {
            if modulo == 8 {
                body.push(((n_r & 0x7) << 5) | ((req.poll as u8) << 4) | ((n_s & 0x7) << 1));
            } else {
                body.push((n_s & 0x7f) << 1);
                body.push(((n_r & 0x7f) << 1) | (req.poll as u8));
            }
            body.push(PID_NO_L3);
            if let Some(payload) = &req.payload {
                body.extend_from_slice(payload);
            }
        }
        FrameKind::RR | FrameKind::RNR | FrameKind::REJ | FrameKind::SREJ => {
            let ss = s_frame_ss(req.kind).expect("checked above");
            if modulo == 8 {
                body.push(((n_r & 0x7) << 5) | ((req.poll as u8) << 4) | (ss << 2) | 0b01);
            } else {
                body.push((ss << 2) | 0b01);
                body.push(((n_r & 0x7f) << 1) | (req.poll as u8));
            }
        }
        kind => {
            let (high3, low4) = u_frame_bits(kind)?;
            body.push((high3 << 5) | ((req.poll as u8) << 4) | low4);
            if matches!(kind, FrameKind::UI) {
                body.push(PID_NO_L3);
                if let Some(payload) = &req.payload {
                    body.extend_from_slice(payload);
                }
            }
        }
    }

    let fcs = crc::kermit(&body);
    let mut wire = bits::mirror_bytes(&body);
    wire.extend_from_slice(&fcs.to_be_bytes());

    let body_bits = bits::bytes_to_bits(&wire);
    let mut stuffed = bits::stuff(&body_bits);
    stuffed.extend_from_slice(&FLAG_BITS);
    let packed = bits::bits_to_bytes(&stuffed);

    let mut out = Vec::with_capacity(packed.len() + 1);
    out.push(FLAG);
    out.extend_from_slice(&packed);
    Some(out)
}

/// Parse a flag-delimited, destuffed frame body (as produced by
/// [`bitstream::Extractor`](crate::ax25::bitstream::Extractor)) into a
/// [`DecodedFrame`]. `vr` is the link's current `V(R)`, needed to classify
/// an I-frame as in-sequence or as a `Recovery` break.
pub fn parse_frame(
    raw: &[u8],
    local: &Address,
    modulo: u8,
    vr: u8,
) -> Result<DecodedFrame, LinkError> {
    if raw.len() < 16 {
        return Err(LinkError::Malformed(format!(
            "frame too short: {} bytes",
            raw.len()
        )));
    }
    let (body_mirrored, fcs_bytes) = raw.split_at(raw.len() - 2);
    let body = bits::mirror_bytes(body_mirrored);

    let dest_raw: [u8; 7] = body[0..7].try_into().unwrap();
    let src_raw: [u8; 7] = body[7..14].try_into().unwrap();

    let (dest, dest_cr, _) = Address::decode(&dest_raw).ok_or(LinkError::WrongDestination)?;
    if dest != *local {
        return Err(LinkError::WrongDestination);
    }
    let (_src, src_cr, _) = Address::decode(&src_raw)
        .ok_or_else(|| LinkError::Malformed("bad source address".into()))?;
    let command = dest_cr && !src_cr;

    let fcs_received = u16::from_be_bytes(fcs_bytes.try_into().unwrap());
    let fcs_computed = crc::kermit(&body);
    if fcs_received != fcs_computed {
        return Err(LinkError::Malformed(format!(
            "CRC mismatch: want {fcs_computed:04x} got {fcs_received:04x}"
        )));
    }

    let c0 = body[14];
    if c0 & 0x01 == 0 {
        // I-frame.
        let (n_r, n_s, poll, control_len) = if modulo == 8 {
            ((c0 >> 5) & 0x7, (c0 >> 1) & 0x7, (c0 >> 4) & 1 == 1, 1usize)
        } else {
            let c1 = *body
                .get(15)
                .ok_or_else(|| LinkError::Malformed("truncated extended control field".into()))?;
            ((c1 >> 1) & 0x7f, (c0 >> 1) & 0x7f, c1 & 1 == 1, 2usize)
        };
        let pid_pos = 14 + control_len;
        if body.len() <= pid_pos {
            return Err(LinkError::Malformed("I-frame missing PID".into()));
        }
        let info = body[pid_pos..].to_vec();
        let kind = if n_s == vr {
            DecodedKind::Frame(FrameKind::I)
        } else {
            DecodedKind::Recovery
        };
        Ok(DecodedFrame {
            kind,
            poll,
            info: Some(info),
            n_r,
            n_s: Some(n_s),
            command,
        })
    } else if c0 & 0x03 == 0b01 {
        // S-frame.
        let (n_r, poll, ss) = if modulo == 8 {
            ((c0 >> 5) & 0x7, (c0 >> 4) & 1 == 1, (c0 >> 2) & 0x3)
        } else {
            let c1 = *body
                .get(15)
                .ok_or_else(|| LinkError::Malformed("truncated extended control field".into()))?;
            ((c1 >> 1) & 0x7f, c1 & 1 == 1, (c0 >> 2) & 0x3)
        };
        let kind = s_frame_kind(ss)
            .ok_or_else(|| LinkError::Malformed(format!("unknown S-frame ss={ss:#04b}")))?;
        Ok(DecodedFrame {
            kind: DecodedKind::Frame(kind),
            poll,
            info: None,
            n_r,
            n_s: None,
            command,
        })
    } else {
        // U-frame.
        let high3 = (c0 >> 5) & 0x7;
        let poll = (c0 >> 4) & 1 == 1;
        let low4 = c0 & 0xf;
        let kind = u_frame_kind(high3, low4)
            .ok_or_else(|| LinkError::Malformed(format!("unknown U-frame control={c0:#04x}")))?;
        let info = if matches!(kind, FrameKind::UI) {
            if body.len() <= 15 {
                return Err(LinkError::Malformed("UI-frame missing PID".into()));
            }
            Some(body[15..].to_vec())
        } else {
            None
        };
        Ok(DecodedFrame {
            kind: DecodedKind::Frame(kind),
            poll,
            info,
            n_r: 0,
            n_s: None,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// S1 — single I-frame round trip, the exact wire bytes from the
    /// protocol's worked example.
    #[test]
    fn s1_single_iframe_round_trip() {
        let src = Address::new("HWUGND", 1);
        let dest = Address::new("HWUSAT", 1);
        let req = FrameRequest {
            dest,
            kind: FrameKind::I,
            poll: false,
            payload: Some(vec![0x01, 0x02, 0x03]),
            command: true,
        };
        let wire = build_frame(&req, &src, 8, 0, 0).expect("build");
        let expected = [
            0x7e, 0x12, 0xea, 0xaa, 0xca, 0x82, 0x2a, 0x47, 0x12, 0xea, 0xaa, 0xe2, 0x72, 0x22,
            0xc6, 0x00, 0x0f, 0x80, 0x20, 0x60, 0x7d, 0xf4, 0xcf, 0xc0,
        ];
        assert_eq!(wire, expected);
    }

    #[test]
    fn round_trip_property() {
        let src = Address::new("N0CALL", 0);
        let dest = Address::new("N1CALL", 2);
        for payload in [vec![], vec![0xaa], vec![1, 2, 3, 4, 5, 6, 7, 8]] {
            let req = FrameRequest {
                dest,
                kind: FrameKind::I,
                poll: true,
                payload: Some(payload.clone()),
                command: true,
            };
            let wire = build_frame(&req, &src, 8, 5, 3).unwrap();
            // Strip flags and undo stuffing the way the extractor would.
            let body_bits: Vec<bool> = bits::bytes_to_bits(&wire[1..wire.len()])
                .into_iter()
                .collect();
            // Find closing flag from the tail.
            let mut unstuffed = Vec::new();
            let mut ones = 0u32;
            let mut i = 0;
            while i < body_bits.len() {
                if body_bits[i..].starts_with(&FLAG_BITS) {
                    break;
                }
                let bit = body_bits[i];
                if ones == 5 {
                    ones = 0;
                    i += 1;
                    continue;
                }
                unstuffed.push(bit);
                ones = if bit { ones + 1 } else { 0 };
                i += 1;
            }
            let raw = bits::bits_to_bytes(&unstuffed);
            let decoded = parse_frame(&raw, &dest, 8, 3).unwrap();
            assert_eq!(decoded.n_s, Some(5));
            assert_eq!(decoded.n_r, 3);
            assert!(decoded.command);
            assert_eq!(decoded.info.unwrap()[1..], payload[..]);
        }
    }
}
