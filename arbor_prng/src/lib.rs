// Random sources for grammar expansion.
//
// `ArborRng` is a xoshiro256++ generator (Blackman & Vigna, 2019) seeded via
// SplitMix64. It is hand-rolled so a given seed expands the same grammar into
// the same symbol string on every platform and toolchain.
//
// The production engine in `arbor_lsys` never talks to `ArborRng` directly.
// It draws through the `RandomSource` trait, which has exactly one job:
// produce a float in [0, 1). That seam lets tests swap in `ReplaySource`,
// which plays back a fixed script of draws so a test can land a value exactly
// on a cumulative-weight boundary and assert which alternative wins.
//
// **Critical constraint: determinism.** For a fixed seed, every method on
// `ArborRng` must produce identical output regardless of platform, compiler
// version, or optimization level. The core generator is integer-only; floats
// appear only in the final conversion to the unit interval.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of uniform draws in [0, 1).
///
/// Anything that can hand out unit-interval floats can drive weighted rule
/// selection. Implementations must never return a value outside [0, 1) when
/// used with real weights, or the selection fallback (last alternative) kicks
/// in more often than the weights say it should.
pub trait RandomSource {
    /// Next uniform draw in [0, 1).
    fn next_unit(&mut self) -> f32;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f32 {
        (**self).next_unit()
    }
}

/// Xoshiro256++ PRNG.
///
/// Each generation run owns its own `ArborRng`. The generator is stateful, so
/// two runs must never share one concurrently; clone it or seed a fresh one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArborRng {
    s: [u64; 4],
}

impl ArborRng {
    /// Create a generator from a `u64` seed.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// (0, 1, 2, ...) still produce unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator from a non-reproducible seed.
    ///
    /// Used for "unseeded" runs. The seed mixes the process's randomized
    /// hasher keys with the wall clock; call `entropy_seed()` instead if the
    /// caller wants to log the seed and replay the run later.
    pub fn from_entropy() -> Self {
        Self::new(entropy_seed())
    }

    /// Next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f32` in [0, 1) from the upper 24 bits.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

impl RandomSource for ArborRng {
    fn next_unit(&mut self) -> f32 {
        self.next_f32()
    }
}

/// Plays back a fixed list of draws, wrapping around at the end.
///
/// Values are returned as given; scripting a value outside [0, 1) is allowed
/// and exercises the engine's last-alternative fallback. An empty script
/// always yields 0.0.
#[derive(Clone, Debug, Default)]
pub struct ReplaySource {
    values: Vec<f32>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Number of draws handed out so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ReplaySource {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// A fresh, non-reproducible seed.
pub fn entropy_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    RandomState::new().hash_one(nanos)
}

/// SplitMix64, used only to expand a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = ArborRng::new(7);
        let mut b = ArborRng::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn neighbouring_seeds_diverge() {
        let mut a = ArborRng::new(7);
        let mut b = ArborRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_draws_stay_in_range() {
        let mut rng = ArborRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v), "draw out of range: {v}");
        }
    }

    #[test]
    fn unit_draws_cover_interval() {
        // Rough uniformity check: each tenth of [0, 1) gets 7%-13% of draws.
        let mut rng = ArborRng::new(99);
        let mut buckets = [0u32; 10];
        let n = 20_000;
        for _ in 0..n {
            let idx = (rng.next_unit() * 10.0) as usize;
            buckets[idx.min(9)] += 1;
        }
        for (i, count) in buckets.iter().enumerate() {
            let pct = *count as f64 / n as f64;
            assert!(
                (0.07..0.13).contains(&pct),
                "bucket {i} got {:.1}%",
                pct * 100.0
            );
        }
    }

    #[test]
    fn state_survives_serialization() {
        let mut rng = ArborRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: ArborRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }

    #[test]
    fn replay_wraps_and_counts() {
        let mut src = ReplaySource::new(vec![0.25, 0.75]);
        assert_eq!(src.next_unit(), 0.25);
        assert_eq!(src.next_unit(), 0.75);
        assert_eq!(src.next_unit(), 0.25);
        assert_eq!(src.draws(), 3);
    }

    #[test]
    fn empty_replay_yields_zero() {
        let mut src = ReplaySource::default();
        assert_eq!(src.next_unit(), 0.0);
        assert_eq!(src.draws(), 1);
    }

    #[test]
    fn mutable_reference_forwards_draws() {
        fn draw_twice<R: RandomSource>(mut rng: R) -> (f32, f32) {
            (rng.next_unit(), rng.next_unit())
        }
        let mut src = ReplaySource::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(draw_twice(&mut src), (0.1, 0.2));
        // The borrowed source advanced.
        assert_eq!(src.next_unit(), 0.3);
    }

    #[test]
    fn entropy_rngs_differ() {
        // Distinct RandomState keys per call make a collision vanishingly
        // unlikely.
        let mut a = ArborRng::from_entropy();
        let mut b = ArborRng::from_entropy();
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
