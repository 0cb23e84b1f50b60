//! Simulated time values.
//!
//! This crate has no scheduler of its own: every periodic or time-sensitive operation
//! ([`crate::pi_controller::PiController::sample`], [`crate::dual_queue::DualQueue::enqueue`]/
//! [`dequeue`](crate::dual_queue::DualQueue::dequeue)) takes the current instant as an argument
//! rather than reading a wall clock. [`Instant`] and [`Duration`] are the value types that flow
//! across that boundary.

use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// A point in simulated time, represented as microseconds since an arbitrary epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    micros: i64,
}

impl Instant {
    pub const ZERO: Instant = Instant { micros: 0 };

    pub fn from_micros(micros: i64) -> Instant {
        Instant { micros }
    }

    pub fn from_millis(millis: i64) -> Instant {
        Instant {
            micros: millis * 1_000,
        }
    }

    pub fn from_secs(secs: i64) -> Instant {
        Instant {
            micros: secs * 1_000_000,
        }
    }

    pub fn from_secs_f64(secs: f64) -> Instant {
        Instant {
            micros: (secs * 1_000_000.0).round() as i64,
        }
    }

    pub fn total_micros(&self) -> i64 {
        self.micros
    }

    pub fn total_millis(&self) -> i64 {
        self.micros / 1_000
    }

    pub fn secs(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }

    /// Duration elapsed between `earlier` and `self`. Returns [`Duration::ZERO`] if `self` is
    /// not after `earlier` (callers treat "before it arrived" as zero sojourn, never negative).
    pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
        if self.micros <= earlier.micros {
            Duration::ZERO
        } else {
            Duration::from_micros((self.micros - earlier.micros) as u64)
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.6}s", self.secs())
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;
    fn add(self, rhs: Duration) -> Instant {
        Instant::from_micros(self.micros + rhs.micros as i64)
    }
}

impl AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        self.micros += rhs.micros as i64;
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;
    fn sub(self, rhs: Duration) -> Instant {
        Instant::from_micros(self.micros - rhs.micros as i64)
    }
}

impl Sub<Instant> for Instant {
    type Output = Duration;
    fn sub(self, rhs: Instant) -> Duration {
        self.saturating_duration_since(rhs)
    }
}

/// A span of simulated time, represented as microseconds. Always non-negative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    micros: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration { micros: 0 };

    pub fn from_micros(micros: u64) -> Duration {
        Duration { micros }
    }

    pub fn from_millis(millis: u64) -> Duration {
        Duration {
            micros: millis * 1_000,
        }
    }

    pub fn from_secs(secs: u64) -> Duration {
        Duration {
            micros: secs * 1_000_000,
        }
    }

    pub fn from_secs_f64(secs: f64) -> Duration {
        Duration {
            micros: (secs * 1_000_000.0).round() as u64,
        }
    }

    pub fn total_micros(&self) -> u64 {
        self.micros
    }

    pub fn total_millis(&self) -> u64 {
        self.micros / 1_000
    }

    pub fn secs(&self) -> f64 {
        self.micros as f64 / 1_000_000.0
    }

    pub fn is_zero(&self) -> bool {
        self.micros == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.6}s", self.secs())
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration::from_micros(self.micros + rhs.micros)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        self.micros += rhs.micros;
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration::from_micros(self.micros.saturating_sub(rhs.micros))
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Duration) {
        self.micros = self.micros.saturating_sub(rhs.micros);
    }
}
