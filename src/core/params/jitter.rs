//! Randomness sources for synthesis parameter jitter.
//!
//! The resolver never touches a global RNG; callers hand it a `JitterSource`
//! so tests can replay a fixed sequence of offsets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces bounded random offsets
pub trait JitterSource: Send {
    /// Return an offset in `[-amplitude, +amplitude]`
    fn offset(&mut self, amplitude: f32) -> f32;
}

/// Jitter drawn from a generator seeded from OS entropy at construction
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    /// Create a freshly seeded source. Build one per request.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible source for benchmarks and debugging
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl JitterSource for RandomJitter {
    fn offset(&mut self, amplitude: f32) -> f32 {
        let amplitude = amplitude.abs();
        if amplitude == 0.0 {
            return 0.0;
        }
        self.rng.random_range(-amplitude..=amplitude)
    }
}

/// Always returns zero
#[derive(Debug, Default, Clone, Copy)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn offset(&mut self, _amplitude: f32) -> f32 {
        0.0
    }
}

/// Replays a fixed list of offsets, cycling when exhausted.
///
/// Values outside the requested amplitude are clamped into range.
#[derive(Debug, Clone)]
pub struct SequenceJitter {
    values: Vec<f32>,
    position: usize,
}

impl SequenceJitter {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            position: 0,
        }
    }
}

impl JitterSource for SequenceJitter {
    fn offset(&mut self, amplitude: f32) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        let amplitude = amplitude.abs();
        value.clamp(-amplitude, amplitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_jitter_stays_in_range() {
        let mut jitter = RandomJitter::new();
        for _ in 0..1000 {
            let value = jitter.offset(0.03);
            assert!((-0.03..=0.03).contains(&value), "offset {value} out of range");
        }
    }

    #[test]
    fn test_random_jitter_zero_amplitude() {
        let mut jitter = RandomJitter::seeded(7);
        assert_eq!(jitter.offset(0.0), 0.0);
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let mut a = RandomJitter::seeded(42);
        let mut b = RandomJitter::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.offset(0.03), b.offset(0.03));
        }
    }

    #[test]
    fn test_sequence_jitter_cycles_and_clamps() {
        let mut jitter = SequenceJitter::new(vec![0.01, -0.5]);
        assert_eq!(jitter.offset(0.03), 0.01);
        assert_eq!(jitter.offset(0.03), -0.03);
        assert_eq!(jitter.offset(0.03), 0.01);

        let mut empty = SequenceJitter::new(Vec::new());
        assert_eq!(empty.offset(0.03), 0.0);
    }
}
