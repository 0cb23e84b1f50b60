//! The PI² probability controller shared by the dual-queue's Classic and L4S paths.
//!
//! Grounded on `pi-square-queue-disc.cc`'s `CalculateP` and
//! `dual-queue-pi-square-queue-disc.cc`'s `CalculateP`, generalized to the cleaned-up update law:
//! a single base probability `p` is integrated from queue-delay error and error-rate, then
//! exposed to callers as `p_classic = p * p` and `p_l4s = min(k * p, 1)`.

use crate::config::PiConfig;
use crate::error::ConfigError;
use crate::time::Duration;

/// Outcome of a [`PiController::sample`] call, useful for asserting the skip-on-just-arrived
/// rule in tests without a live dual-queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// `p` was recomputed from the PI law.
    Updated,
    /// The queue looked empty-but-just-arrived; `p` was left untouched.
    Skipped,
}

/// A PI² controller. Owned by a [`crate::dual_queue::DualQueue`]; see that module's docs for why
/// ownership runs queue-owns-controller rather than the reverse.
#[derive(Debug, Clone, Copy)]
pub struct PiController {
    p: f64,
    q_delay_prev: Duration,
    alpha_u: f64,
    beta_u: f64,
    t_update: Duration,
    target_delay: Duration,
    k: u32,
    cancelled: bool,
}

impl PiController {
    pub fn new(config: PiConfig) -> Result<PiController, ConfigError> {
        if config.t_update.is_zero() {
            return Err(ConfigError::NonPositiveUpdatePeriod(config.t_update));
        }
        if config.k == 0 {
            return Err(ConfigError::InvalidCouplingFactor(config.k));
        }
        Ok(PiController {
            p: 0.0,
            q_delay_prev: Duration::ZERO,
            alpha_u: config.alpha * config.t_update.secs(),
            beta_u: config.beta * config.t_update.secs(),
            t_update: config.t_update,
            target_delay: config.target_delay,
            k: config.k,
            cancelled: false,
        })
    }

    /// Sample period, for callers driving their own scheduling loop.
    pub fn update_period(&self) -> Duration {
        self.t_update
    }

    /// Primes the controller for a run starting at `t_start`. The crate owns no timer handle of
    /// its own (see the concurrency & resource model docs); this exists so callers have a single
    /// entry point that mirrors the source system's `Start`, and so `cancel` has a clear
    /// "was started" counterpart to pair with in reading order.
    pub fn start(&mut self, _t_start: crate::time::Instant) {
        self.cancelled = false;
    }

    /// Marks the controller inert. Further `sample()` calls become no-ops, modeling "tearing
    /// down the controller cancels the pending event" without this crate owning the event handle
    /// itself.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Update `p` from a queue-delay observation.
    ///
    /// `q_now` is the sojourn time of the oldest packet in the Classic queue, or
    /// [`Duration::ZERO`] if it's empty. `dual_queue_nonempty` is whether the combined dual-queue
    /// (Classic + L4S) holds anything at all; when `q_now` is zero but the dual-queue isn't, the
    /// head item has just arrived and the update is skipped for this tick.
    pub fn sample(&mut self, q_now: Duration, dual_queue_nonempty: bool) -> SampleOutcome {
        if self.cancelled {
            return SampleOutcome::Skipped;
        }
        if q_now.is_zero() && dual_queue_nonempty {
            return SampleOutcome::Skipped;
        }

        let delta = self.alpha_u * (q_now.secs() - self.target_delay.secs())
            + self.beta_u * (q_now.secs() - self.q_delay_prev.secs());
        let mut p = self.p + delta;

        if q_now.is_zero() && self.q_delay_prev.is_zero() {
            p *= 0.98;
        }

        self.p = p.clamp(0.0, 1.0);
        if !(0.0..=1.0).contains(&self.p) {
            log::warn!("pi controller: p out of range after clamp, this is a bug");
        }
        self.q_delay_prev = q_now;
        SampleOutcome::Updated
    }

    /// Current base probability.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Classic drop/mark probability, `p^2`.
    pub fn p_classic(&self) -> f64 {
        self.p * self.p
    }

    /// L4S mark probability, `min(k * p, 1)`.
    pub fn p_l4s(&self) -> f64 {
        (self.k as f64 * self.p).min(1.0)
    }

    /// Coupling factor.
    pub fn k(&self) -> u32 {
        self.k
    }
}
