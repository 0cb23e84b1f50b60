//! The DualQ Coupled AQM: two FIFOs (Classic, L4S) arbitrated by a time-shift rule and marked /
//! dropped according to probabilities derived from a shared [`PiController`].
//!
//! Grounded on `dual-queue-pi-square-queue-disc.cc`'s `DoEnqueue`/`DoDequeue`/`CheckConfig`. The
//! cyclic-ownership hazard between the PI controller (which wants the queue's head-sojourn) and
//! the dual-queue (which wants the controller's probabilities) is broken by having `DualQueue`
//! own the `PiController` outright and feed it sojourn observations by value on each
//! [`DualQueue::sample_pi`] call, rather than the controller holding a callback back into the
//! queue.

use std::collections::VecDeque;

use crate::config::DualQueueConfig;
use crate::error::ConfigError;
use crate::item::Item;
use crate::pi_controller::PiController;
use crate::rng::StreamRng;
use crate::time::{Duration, Instant};

/// Unit that [`DualQueueConfig::limit`] and occupancy are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Packets,
    Bytes,
}

/// Drop/mark counters, incremented as the AQM runs. Never reset automatically.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Enqueue failed because occupancy would exceed `limit`.
    pub forced_drop: u64,
    /// Classic item dropped on the probabilistic coin flip because it wasn't ECN-capable.
    pub unforced_classic_drop: u64,
    /// Classic item ECN-marked on the probabilistic coin flip.
    pub unforced_classic_mark: u64,
    /// L4S item ECN-marked (threshold step-marker or probabilistic coin flip).
    pub unforced_l4s_mark: u64,
}

struct Slot<T> {
    enqueued_at: Instant,
    item: T,
}

/// Two bounded FIFOs (Classic `Q0`, L4S `Q1`) plus the coupled PI² controller that derives their
/// mark/drop probabilities.
pub struct DualQueue<T: Item> {
    q0: VecDeque<Slot<T>>,
    q1: VecDeque<Slot<T>>,
    config: DualQueueConfig,
    pi: PiController,
    t_shift: Duration,
    rng: StreamRng,
    stats: Stats,
}

impl<T: Item> DualQueue<T> {
    /// Construct a dual-queue, validating the configuration per `CheckConfig` in the source
    /// system. Both internal FIFOs are created here (this crate has no pluggable internal-queue
    /// injection, so the "exactly two FIFOs, no extra classes/filters" checks collapse to
    /// validating the config record itself).
    pub fn new(config: DualQueueConfig, rng: StreamRng) -> Result<DualQueue<T>, ConfigError> {
        if config.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if config.mean_pkt_size == 0 {
            return Err(ConfigError::ZeroMeanPacketSize);
        }
        let pi = PiController::new(config.pi)?;
        Ok(DualQueue {
            q0: VecDeque::new(),
            q1: VecDeque::new(),
            t_shift: config.pi.target_delay + config.pi.target_delay,
            config,
            pi,
            rng,
            stats: Stats::default(),
        })
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn config(&self) -> &DualQueueConfig {
        &self.config
    }

    /// Current PI² base probability.
    pub fn p(&self) -> f64 {
        self.pi.p()
    }

    pub fn p_classic(&self) -> f64 {
        self.pi.p_classic()
    }

    pub fn p_l4s(&self) -> f64 {
        self.pi.p_l4s()
    }

    fn unit(&self, size_bytes: u32) -> u32 {
        match self.config.mode {
            Mode::Packets => 1,
            Mode::Bytes => size_bytes,
        }
    }

    fn queue_occupancy(&self, q: &VecDeque<Slot<T>>) -> u32 {
        match self.config.mode {
            Mode::Packets => q.len() as u32,
            Mode::Bytes => q.iter().map(|s| s.item.size()).sum(),
        }
    }

    /// Total occupancy across both FIFOs, in the unit dictated by `mode`.
    pub fn occupancy(&self) -> u32 {
        self.queue_occupancy(&self.q0) + self.queue_occupancy(&self.q1)
    }

    pub fn is_empty(&self) -> bool {
        self.q0.is_empty() && self.q1.is_empty()
    }

    /// Sojourn time of the oldest Classic (Q0) packet, or [`Duration::ZERO`] if Q0 is empty.
    /// This is the observation the PI controller integrates against.
    pub fn head_sojourn(&self, now: Instant) -> Duration {
        match self.q0.front() {
            Some(slot) => now.saturating_duration_since(slot.enqueued_at),
            None => Duration::ZERO,
        }
    }

    /// Drive the PI controller's periodic sample. Callers invoke this on their own
    /// `t_update`-spaced cadence (see the concurrency & resource model docs — this crate owns no
    /// scheduler or timer handle of its own).
    pub fn sample_pi(&mut self, now: Instant) {
        let q_now = self.head_sojourn(now);
        self.pi.sample(q_now, !self.is_empty());
    }

    /// Stamp `item` with `now` and route it to Q0 or Q1 by `item.is_l4s()`. Fails (and counts a
    /// forced drop) if enqueuing would push total occupancy over `limit`.
    pub fn enqueue(&mut self, item: T, now: Instant) -> Result<(), T> {
        let incoming = self.unit(item.size());
        if self.occupancy() + incoming > self.config.limit {
            self.stats.forced_drop += 1;
            return Err(item);
        }
        let slot = Slot {
            enqueued_at: now,
            item,
        };
        if slot.item.is_l4s() {
            self.q1.push_back(slot);
        } else {
            self.q0.push_back(slot);
        }
        Ok(())
    }

    fn min_l4s_ok(&self) -> bool {
        match self.config.mode {
            Mode::Packets => self.q1.len() as u32 > 2,
            Mode::Bytes => self.queue_occupancy(&self.q1) > 2 * self.config.mean_pkt_size,
        }
    }

    /// Serve the next packet, applying the scheduling rule, marking, and probabilistic drop.
    /// Returns `None` once both FIFOs are empty.
    pub fn dequeue(&mut self, now: Instant) -> Option<T> {
        loop {
            let ts0 = self.q0.front().map(|s| s.enqueued_at).unwrap_or(Instant::ZERO);
            let ts1 = self.q1.front().map(|s| s.enqueued_at).unwrap_or(Instant::ZERO);

            let serve_l4s = !self.q1.is_empty() && (ts1 + self.t_shift) >= ts0;

            if serve_l4s {
                let mut slot = self.q1.pop_front().expect("checked non-empty above");
                let sojourn = now.saturating_duration_since(slot.enqueued_at);
                let min_l4s_ok = self.min_l4s_ok();
                let threshold_hit = sojourn > self.config.l4s_threshold && min_l4s_ok;
                let coin_hit = self.rng.next_uniform() < self.pi.p_l4s();
                if threshold_hit || coin_hit {
                    if slot.item.mark() {
                        self.stats.unforced_l4s_mark += 1;
                    }
                }
                return Some(slot.item);
            } else if !self.q0.is_empty() {
                let mut slot = self.q0.pop_front().expect("checked non-empty above");
                let coin_hit = self.rng.next_uniform() < (self.pi.p_classic() / self.pi.k() as f64);
                if coin_hit {
                    if slot.item.mark() {
                        self.stats.unforced_classic_mark += 1;
                        return Some(slot.item);
                    } else {
                        self.stats.unforced_classic_drop += 1;
                        continue;
                    }
                }
                return Some(slot.item);
            } else {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct TestItem {
        size: u32,
        l4s: bool,
        ecn_capable: bool,
        marked: bool,
    }

    impl TestItem {
        fn classic(ecn_capable: bool) -> TestItem {
            TestItem {
                size: 1000,
                l4s: false,
                ecn_capable,
                marked: false,
            }
        }
        fn l4s() -> TestItem {
            TestItem {
                size: 1000,
                l4s: true,
                ecn_capable: true,
                marked: false,
            }
        }
    }

    impl Item for TestItem {
        fn size(&self) -> u32 {
            self.size
        }
        fn is_l4s(&self) -> bool {
            self.l4s
        }
        fn is_ecn_capable(&self) -> bool {
            self.ecn_capable
        }
        fn mark(&mut self) -> bool {
            if self.ecn_capable {
                self.marked = true;
                true
            } else {
                false
            }
        }
    }

    fn queue(limit: u32, mode: Mode) -> DualQueue<TestItem> {
        let config = DualQueueConfig {
            limit,
            mode,
            ..DualQueueConfig::default()
        };
        DualQueue::new(config, StreamRng::new(1)).unwrap()
    }

    #[test]
    fn forced_drop_over_capacity() {
        let mut q = queue(2, Mode::Packets);
        let now = Instant::ZERO;
        assert!(q.enqueue(TestItem::classic(true), now).is_ok());
        assert!(q.enqueue(TestItem::classic(true), now).is_ok());
        assert!(q.enqueue(TestItem::classic(true), now).is_err());
        assert_eq!(q.stats().forced_drop, 1);
    }

    #[test]
    fn routes_by_l4s_flag() {
        let mut q = queue(10, Mode::Packets);
        let now = Instant::ZERO;
        q.enqueue(TestItem::classic(true), now).unwrap();
        q.enqueue(TestItem::l4s(), now).unwrap();
        assert_eq!(q.q0.len(), 1);
        assert_eq!(q.q1.len(), 1);
    }

    #[test]
    fn l4s_only_workload_never_touches_classic_counters() {
        let mut q = queue(50, Mode::Packets);
        let mut now = Instant::ZERO;
        for _ in 0..40 {
            q.enqueue(TestItem::l4s(), now).unwrap();
            now += Duration::from_millis(1);
        }
        while q.dequeue(now).is_some() {
            now += Duration::from_millis(1);
        }
        let stats = q.stats();
        assert_eq!(stats.forced_drop, 0);
        assert_eq!(stats.unforced_classic_drop, 0);
        assert_eq!(stats.unforced_classic_mark, 0);
    }

    #[test]
    fn classic_non_ecn_coin_hit_drops_not_marks() {
        // Force p_classic close to 1 by letting one packet sit for far longer than
        // target_delay, then enqueue a full queue's worth of non-ECN-capable Classic items and
        // drain it. Every probabilistic hit on a non-ECN item must show up as a drop, never a
        // mark, no matter how large p_classic gets.
        let mut q = queue(64, Mode::Packets);
        let mut now = Instant::ZERO;
        q.enqueue(TestItem::classic(false), now).unwrap();
        now += Duration::from_millis(500);
        q.sample_pi(now);
        assert!(q.p() > 0.5, "expected p to have climbed under sustained delay, got {}", q.p());

        for _ in 0..40 {
            let _ = q.enqueue(TestItem::classic(false), now);
        }
        while q.dequeue(now).is_some() {}

        assert_eq!(q.stats().unforced_classic_mark, 0);
        assert!(q.stats().unforced_classic_drop > 0);
    }

    #[test]
    fn scheduler_never_serves_q0_while_l4s_sustained_and_q0_empty() {
        let mut q = queue(50, Mode::Packets);
        let mut now = Instant::ZERO;
        for _ in 0..30 {
            q.enqueue(TestItem::l4s(), now).unwrap();
            now += Duration::from_millis(1);
            let item = q.dequeue(now).unwrap();
            assert!(item.is_l4s());
        }
    }

    #[test]
    fn min_l4s_ok_guard_respected_in_packets_mode() {
        let mut q = queue(50, Mode::Packets);
        let mut now = Instant::ZERO;
        for _ in 0..5 {
            q.enqueue(TestItem::l4s(), now).unwrap();
        }
        now += Duration::from_millis(5);
        // With 5 queued and serving from the front, after removal 4 remain: > 2, guard holds.
        let _ = q.dequeue(now);
        assert!(q.min_l4s_ok());
    }

    #[test]
    fn rejects_zero_limit() {
        let config = DualQueueConfig {
            limit: 0,
            ..DualQueueConfig::default()
        };
        let result: Result<DualQueue<TestItem>, _> = DualQueue::new(config, StreamRng::new(1));
        assert!(matches!(result, Err(ConfigError::ZeroLimit)));
    }
}
