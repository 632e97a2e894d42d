//! Per-link configuration.

use std::time::Duration;

use super::address::Address;

/// REJ/SREJ recovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejMode {
    /// Go-back-N: a single REJ re-sends everything from the break onward.
    Rej,
    /// Selective Reject: one SREJ per missing frame.
    Srej,
}

/// Configuration for one link instance.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Local station address.
    pub local: Address,
    /// Remote station address.
    pub remote: Address,
    /// Reserved for future half-duplex PTT gating; not consulted by the
    /// core data-transfer logic.
    pub full_duplex: bool,
    /// REJ or SREJ recovery mode.
    pub rej: RejMode,
    /// Sequence number modulus: 8 or 128.
    pub modulo: u8,
    /// Maximum payload bytes per I-frame.
    pub information_field_length: usize,
    /// Outstanding-I-frame window size, clamped to `< modulo`.
    pub receive_window_k: u8,
    /// T1 (acknowledgement timer) duration.
    pub ack_timer: Duration,
    /// T1 expirations allowed before a fatal retry-exhaustion error.
    pub retries: u32,
    /// T3 (link integrity timer) duration.
    pub timer_t3: Duration,
}

impl LinkConfig {
    /// Build a config for `local`/`remote` with AX.25 v2.2's usual defaults.
    pub fn new(local: Address, remote: Address) -> Self {
        Self {
            local,
            remote,
            full_duplex: false,
            rej: RejMode::Srej,
            modulo: 8,
            information_field_length: 2048,
            receive_window_k: 7,
            ack_timer: Duration::from_secs(3),
            retries: 10,
            timer_t3: Duration::from_secs(10),
        }
    }

    /// Set the REJ/SREJ recovery mode.
    pub fn with_rej(mut self, rej: RejMode) -> Self {
        self.rej = rej;
        self
    }

    /// Set the sequence number modulus (8 or 128); other values are
    /// ignored and the previous value kept.
    pub fn with_modulo(mut self, modulo: u8) -> Self {
        if modulo == 8 || modulo == 128 {
            self.modulo = modulo;
        }
        self
    }

    /// Set the receive window size, clamped below `modulo`.
    pub fn with_receive_window_k(mut self, k: u8) -> Self {
        self.receive_window_k = k;
        self.clamp();
        self
    }

    /// Set the maximum I-frame payload length.
    pub fn with_information_field_length(mut self, n: usize) -> Self {
        self.information_field_length = n;
        self
    }

    /// Set the T1/T3/retries trio.
    pub fn with_timers(mut self, ack_timer: Duration, timer_t3: Duration, retries: u32) -> Self {
        self.ack_timer = ack_timer;
        self.timer_t3 = timer_t3;
        self.retries = retries;
        self
    }

    fn clamp(&mut self) {
        if self.receive_window_k == 0 || self.receive_window_k >= self.modulo {
            self.receive_window_k = (self.modulo - 1).min(7);
        }
    }
}
