//! Deterministic PRNG for simulation use (random outputs, soldier rolls).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable for save games.

/// Source of uniform integer draws.
///
/// Production only ever asks for inclusive ranges; tests substitute a
/// scripted source to pin down roulette outcomes.
pub trait RandomDraw {
    /// Uniform integer in `[lo, hi]` inclusive. Returns `lo` when `hi <= lo`.
    fn generate(&mut self, lo: u32, hi: u32) -> u32;
}

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl RandomDraw for SimRng {
    fn generate(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = u64::from(hi - lo) + 1;
        // Multiply-shift maps the upper 32 random bits onto [0, span).
        let offset = ((self.next_u64() >> 32) * span) >> 32;
        lo + offset as u32
    }
}
