//! Deterministic pseudo-random generator
//!
//! 48-bit linear-congruential generator with the `drand48` constants. The
//! output sequence is a pure function of the seed, so the same seed yields
//! the same sequence in every process on every platform.
//!
//! This is NOT a cryptographically secure generator.

const _: () = {
    assert!(Random::MULTIPLIER < Random::MODULUS);
    assert!(Random::MULTIPLIER % 2 == 1);
    assert!(Random::INCREMENT < Random::MODULUS);
};

/// Linear-congruential PRNG over 48 bits of state
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Random {
    state: u64,
}

impl Random {
    pub const MODULUS: u64 = 1 << 48;
    pub const MULTIPLIER: u64 = 0x5_DEEC_E66D;
    pub const INCREMENT: u64 = 0xB;

    const MASK: u64 = Self::MODULUS - 1;

    /// Seed from OS entropy, falling back to the wall clock
    pub fn new() -> Self {
        Self::with_seed(entropy_seed())
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut random = Self { state: 0 };
        random.reseed(seed);
        random
    }

    /// Reset the state as a scrambled function of `seed`
    pub fn reseed(&mut self, seed: u64) {
        self.state = (seed ^ Self::MULTIPLIER) & Self::MASK;
    }

    /// Advance once and return bits 47..16 of the new state
    pub fn generate(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
            & Self::MASK;
        (self.state >> 16) as u32
    }

    /// Value in `0..bound`; `bound == 0` yields 0
    pub fn generate_range(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        ((u64::from(self.generate()) * u64::from(bound)) >> 32) as u32
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

fn entropy_seed() -> u64 {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_ok() {
        return u64::from_le_bytes(bytes);
    }
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
