//! Typed configuration records.
//!
//! The source system binds every tunable through a string-keyed global attribute registry
//! (`TypeId::AddAttribute`). This crate threads plain structs through constructors instead, one
//! per component, with `Default` impls carrying the same design-recommendation defaults.

use crate::dual_queue::Mode;
use crate::time::Duration;

/// Tunables for [`crate::pi_controller::PiController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiConfig {
    /// Sample period (`T_update`).
    pub t_update: Duration,
    /// Classic queue-delay setpoint.
    pub target_delay: Duration,
    /// Proportional gain, per second.
    pub alpha: f64,
    /// Integral gain, per second.
    pub beta: f64,
    /// Coupling factor between Classic and L4S probabilities.
    pub k: u32,
}

impl Default for PiConfig {
    fn default() -> Self {
        PiConfig {
            t_update: Duration::from_millis(16),
            target_delay: Duration::from_millis(15),
            alpha: 10.0,
            beta: 100.0,
            k: 2,
        }
    }
}

/// Tunables for [`crate::dual_queue::DualQueue`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualQueueConfig {
    /// Capacity, in the unit selected by `mode`.
    pub limit: u32,
    /// Unit `limit` is expressed in.
    pub mode: Mode,
    /// Average packet size in bytes; derives the minimum-L4S-length guard (`2 * mean_pkt_size`).
    pub mean_pkt_size: u32,
    /// Step-marking sojourn threshold for L4S.
    pub l4s_threshold: Duration,
    /// Shared PI controller tunables.
    pub pi: PiConfig,
}

impl Default for DualQueueConfig {
    fn default() -> Self {
        DualQueueConfig {
            limit: 25,
            mode: Mode::Packets,
            mean_pkt_size: 1000,
            l4s_threshold: Duration::from_millis(1),
            pi: PiConfig::default(),
        }
    }
}

/// Tunables for [`crate::dctcp::Dctcp`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DctcpConfig {
    /// Estimation gain `g` for the smoothed ECN-marked fraction.
    pub gain: f64,
    /// Starting value of `alpha`.
    pub alpha_init: f64,
    /// Segment size in bytes; the multiplicative-decrease floor is `2 * segment_size`.
    pub segment_size: u32,
}

impl Default for DctcpConfig {
    fn default() -> Self {
        DctcpConfig {
            gain: 1.0 / 16.0,
            alpha_init: 0.0,
            segment_size: 1446,
        }
    }
}
