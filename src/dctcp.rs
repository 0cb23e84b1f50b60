//! The DCTCP sender: the smoothed ECN-marked-fraction estimator (`alpha`) and the CE-mirror
//! state machine that preserves one ACK per CE flip across delayed ACKs.
//!
//! Grounded directly on `tcp-dctcp.h`/`tcp-dctcp.cc`'s `PktsAcked`, `ReduceCwnd`, `CeState0to1`,
//! `CeState1to0`, and `UpdateAckReserved`, following the floating-point variant noted as the
//! intended production one in this crate's design notes. Phrased against the
//! [`CongestionControl`](crate::congestion::CongestionControl) composition instead of
//! subclassing a `NewReno` base, per that same design note.

use crate::congestion::{CongestionControl, CongestionState, NewReno};
use crate::error::ConfigError;
use crate::seq::SequenceNumber;

/// Whether the most recent ACK reflected an ECN-Echo from the receiver. A small subset of
/// `TcpSocketState::TcpEcnState_t` — only the values `PktsAcked`/`CwndEvent` actually inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcnState {
    Idle,
    EceRcvd,
    CeRcvd,
}

/// Congestion-ops events fed in by the socket layer, mirroring
/// `TcpSocketState::TcpCaEvent_t`'s subset this crate cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CwndEvent {
    EcnIsCe,
    EcnNoCe,
    DelayedAck,
    NonDelayedAck,
}

/// Flags on a synthetic empty ACK the CE-mirror state machine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckFlags(u8);

impl AckFlags {
    pub const ACK: AckFlags = AckFlags(0b01);
    pub const ECE: AckFlags = AckFlags(0b10);

    pub fn contains(self, other: AckFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for AckFlags {
    type Output = AckFlags;
    fn bitor(self, rhs: AckFlags) -> AckFlags {
        AckFlags(self.0 | rhs.0)
    }
}

/// The socket-layer seam the CE-mirror state machine needs: emitting a synthetic ACK, and
/// rewinding/restoring the RX buffer's next-expected sequence number around that emission.
/// Modeled as a by-reference context argument rather than a stored back-pointer (see this
/// crate's design notes on avoiding a stored socket back-reference).
pub trait CeMirrorHost {
    /// Emit an empty ACK with the given flags. Best-effort: a `false` return (the socket layer
    /// refused) does not roll back any sender-side state.
    fn send_empty_packet(&mut self, flags: AckFlags) -> bool;

    fn rx_next_seq(&self) -> SequenceNumber;

    fn set_rx_next_seq(&mut self, seq: SequenceNumber);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CeState {
    Ce0,
    Ce1,
}

/// Per-connection DCTCP sender state.
pub struct Dctcp<C: CongestionControl = NewReno> {
    base: C,
    gain: f64,
    segment_size: u32,
    alpha: f64,
    acked_total: u64,
    acked_ecn: u64,
    next_seq_threshold: SequenceNumber,
    next_seq_valid: bool,
    ce_state: CeState,
    delayed_ack_reserved: bool,
    prior_rcv_nxt: SequenceNumber,
    prior_rcv_nxt_valid: bool,
}

impl Dctcp<NewReno> {
    pub fn new(config: crate::config::DctcpConfig) -> Result<Dctcp<NewReno>, ConfigError> {
        Dctcp::with_base(config, NewReno)
    }
}

impl<C: CongestionControl> Dctcp<C> {
    /// Construct a DCTCP adaptor wrapping an arbitrary base congestion-control capability
    /// (normally [`NewReno`]) for ordinary slow-start / congestion-avoidance growth.
    pub fn with_base(config: crate::config::DctcpConfig, base: C) -> Result<Dctcp<C>, ConfigError> {
        if !(0.0..=1.0).contains(&config.gain) || config.gain == 0.0 {
            return Err(ConfigError::InvalidGain(config.gain));
        }
        if config.segment_size == 0 {
            return Err(ConfigError::ZeroSegmentSize);
        }
        Ok(Dctcp {
            base,
            gain: config.gain,
            segment_size: config.segment_size,
            alpha: config.alpha_init.clamp(0.0, 1.0),
            acked_total: 0,
            acked_ecn: 0,
            next_seq_threshold: SequenceNumber::default(),
            next_seq_valid: false,
            ce_state: CeState::Ce0,
            delayed_ack_reserved: false,
            prior_rcv_nxt: SequenceNumber::default(),
            prior_rcv_nxt_valid: false,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn acked_total(&self) -> u64 {
        self.acked_total
    }

    pub fn acked_ecn(&self) -> u64 {
        self.acked_ecn
    }

    /// Grow the congestion window for ordinary (non-ECN) traffic, forwarded unchanged to the
    /// wrapped base capability.
    pub fn increase_window(&self, state: &mut CongestionState, segments_acked: u32) {
        self.base.increase_window(state, segments_acked);
    }

    /// Update `acked_total`/`acked_ecn` and, at the end of an observation window, recompute
    /// `alpha`.
    pub fn packets_acked(
        &mut self,
        segments_acked: u32,
        last_acked_seq: SequenceNumber,
        next_tx_seq: SequenceNumber,
        ecn_state: EcnState,
    ) {
        self.acked_total += segments_acked as u64 * self.segment_size as u64;
        if ecn_state == EcnState::EceRcvd {
            self.acked_ecn += segments_acked as u64 * self.segment_size as u64;
        }

        if !self.next_seq_valid {
            self.next_seq_threshold = next_tx_seq;
            self.next_seq_valid = true;
        }

        if last_acked_seq >= self.next_seq_threshold {
            let frac = if self.acked_total > 0 {
                self.acked_ecn as f64 / self.acked_total as f64
            } else {
                0.0
            };
            self.alpha = ((1.0 - self.gain) * self.alpha + self.gain * frac).clamp(0.0, 1.0);
            self.next_seq_threshold = next_tx_seq;
            self.acked_ecn = 0;
            self.acked_total = 0;
        }
    }

    /// Multiplicative decrease on an ECN signal: `cwnd * (1 - alpha/2)`, floored at two segment
    /// sizes.
    pub fn reduce_cwnd(&mut self, state: &CongestionState) -> u32 {
        let reduced = (state.cwnd as f64 * (1.0 - self.alpha / 2.0)) as u32;
        reduced.max(2 * self.segment_size)
    }

    fn mirror_prior_ack<H: CeMirrorHost>(&mut self, host: &mut H, flags: AckFlags) {
        let current = host.rx_next_seq();
        host.set_rx_next_seq(self.prior_rcv_nxt);
        host.send_empty_packet(flags);
        host.set_rx_next_seq(current);
    }

    /// Receiver CE state transitioned 0 -> 1.
    pub fn ce_state_0_to_1<H: CeMirrorHost>(&mut self, host: &mut H) {
        if self.ce_state == CeState::Ce0 && self.delayed_ack_reserved && self.prior_rcv_nxt_valid {
            self.mirror_prior_ack(host, AckFlags::ACK);
        }
        self.prior_rcv_nxt_valid = true;
        self.prior_rcv_nxt = host.rx_next_seq();
        self.ce_state = CeState::Ce1;
    }

    /// Receiver CE state transitioned 1 -> 0.
    pub fn ce_state_1_to_0<H: CeMirrorHost>(&mut self, host: &mut H) {
        if self.ce_state == CeState::Ce1 && self.delayed_ack_reserved && self.prior_rcv_nxt_valid {
            self.mirror_prior_ack(host, AckFlags::ACK | AckFlags::ECE);
        }
        self.prior_rcv_nxt_valid = true;
        self.prior_rcv_nxt = host.rx_next_seq();
        self.ce_state = CeState::Ce0;
    }

    fn update_ack_reserved(&mut self, event: CwndEvent) {
        match event {
            CwndEvent::DelayedAck => self.delayed_ack_reserved = true,
            CwndEvent::NonDelayedAck => self.delayed_ack_reserved = false,
            _ => {}
        }
    }

    /// Dispatch a congestion-ops event from the socket layer.
    pub fn cwnd_event<H: CeMirrorHost>(&mut self, host: &mut H, event: CwndEvent) {
        match event {
            CwndEvent::EcnIsCe => self.ce_state_0_to_1(host),
            CwndEvent::EcnNoCe => self.ce_state_1_to_0(host),
            CwndEvent::DelayedAck | CwndEvent::NonDelayedAck => self.update_ack_reserved(event),
        }
    }
}
