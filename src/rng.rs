//! Seedable uniform-`[0,1)` draw source.
//!
//! The PI controller's L4S coin flip and the dual-queue's Classic coin flip both need a
//! reproducible pseudo-random stream. [`StreamRng`] mirrors the source system's convention of
//! assigning each stochastic component its own substream index so that a whole-topology run is
//! reproducible run-to-run regardless of which components happen to be constructed first.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A uniform `[0,1)` draw source, seeded independently per component.
#[derive(Debug, Clone)]
pub struct StreamRng {
    rng: StdRng,
}

impl StreamRng {
    /// Seed a stream directly from a 64-bit seed.
    pub fn new(seed: u64) -> StreamRng {
        StreamRng {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derive a component's stream from a base seed and a substream index, mirroring
    /// `AssignStreams(stream)` in the source system. Returns the number of substream indices
    /// consumed (always 1: one [`StreamRng`] per component).
    pub fn assign_stream(base_seed: u64, index: u64) -> (StreamRng, u64) {
        // Mix the index into the seed so that distinct components never share a stream even if
        // constructed from the same base seed.
        let seed = base_seed ^ (index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        (StreamRng::new(seed), 1)
    }

    /// Draw a uniform value in `[0, 1)`.
    pub fn next_uniform(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_in_unit_interval() {
        let mut rng = StreamRng::new(42);
        for _ in 0..1000 {
            let u = rng.next_uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = StreamRng::new(7);
        let mut b = StreamRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_uniform(), b.next_uniform());
        }
    }

    #[test]
    fn assign_stream_consumes_one_index() {
        let (_rng, consumed) = StreamRng::assign_stream(1, 0);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn distinct_substreams_diverge() {
        let (mut a, _) = StreamRng::assign_stream(1, 0);
        let (mut b, _) = StreamRng::assign_stream(1, 1);
        let seq_a: Vec<f64> = (0..8).map(|_| a.next_uniform()).collect();
        let seq_b: Vec<f64> = (0..8).map(|_| b.next_uniform()).collect();
        assert_ne!(seq_a, seq_b);
    }
}
