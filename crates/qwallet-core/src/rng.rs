//! [`RandomSource`] implementations.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::traits::RandomSource;

/// Largest `f64` strictly below 1.0.
const UNIT_MAX: f64 = 1.0 - f64::EPSILON / 2.0;

/// `StdRng`-backed randomness, seeded from the OS or from a fixed value.
pub struct StdRandom(StdRng);

impl StdRandom {
    /// Seed from the operating system's entropy source.
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Deterministic stream for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for StdRandom {
    fn next_unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest);
    }
}

impl fmt::Debug for StdRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StdRandom")
    }
}

/// Replays fixed sequences of unit draws and bytes, cycling when exhausted.
///
/// Empty scripts yield `0.0` and zero bytes. Unit values are clamped into
/// `[0, 1)`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    units: Vec<f64>,
    unit_pos: usize,
    bytes: Vec<u8>,
    byte_pos: usize,
}

impl ScriptedRandom {
    pub fn new(units: impl Into<Vec<f64>>) -> Self {
        Self {
            units: units.into(),
            ..Self::default()
        }
    }

    /// Use `bytes` (cycled) for [`RandomSource::fill_bytes`].
    pub fn with_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.bytes = bytes.into();
        self.byte_pos = 0;
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        if self.units.is_empty() {
            return 0.0;
        }
        let value = self.units[self.unit_pos % self.units.len()];
        self.unit_pos += 1;
        value.clamp(0.0, UNIT_MAX)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if self.bytes.is_empty() {
            dest.fill(0);
            return;
        }
        for byte in dest.iter_mut() {
            *byte = self.bytes[self.byte_pos % self.bytes.len()];
            self.byte_pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_random_units_in_range() {
        let mut rng = StdRandom::from_entropy();
        for _ in 0..1_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn seeded_streams_repeat() {
        let mut a = StdRandom::seeded(7);
        let mut b = StdRandom::seeded(7);
        let mut buf_a = [0u8; 16];
        let mut buf_b = [0u8; 16];
        a.fill_bytes(&mut buf_a);
        b.fill_bytes(&mut buf_b);
        assert_eq!(buf_a, buf_b);
        assert_eq!(a.next_unit(), b.next_unit());
    }

    #[test]
    fn scripted_units_cycle() {
        let mut rng = ScriptedRandom::new([0.1, 0.2]);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.next_unit(), 0.2);
        assert_eq!(rng.next_unit(), 0.1);
    }

    #[test]
    fn scripted_units_clamped() {
        let mut rng = ScriptedRandom::new([1.0, -3.0]);
        assert!(rng.next_unit() < 1.0);
        assert_eq!(rng.next_unit(), 0.0);
    }

    #[test]
    fn scripted_bytes_cycle_across_calls() {
        let mut rng = ScriptedRandom::default().with_bytes([0xAB, 0xCD, 0xEF]);
        let mut first = [0u8; 2];
        let mut second = [0u8; 2];
        rng.fill_bytes(&mut first);
        rng.fill_bytes(&mut second);
        assert_eq!(first, [0xAB, 0xCD]);
        assert_eq!(second, [0xEF, 0xAB]);
    }

    #[test]
    fn empty_script_yields_zeroes() {
        let mut rng = ScriptedRandom::default();
        let mut buf = [0xFFu8; 4];
        rng.fill_bytes(&mut buf);
        assert_eq!(buf, [0; 4]);
        assert_eq!(rng.next_unit(), 0.0);
    }
}
