//! Deterministic random numbers for the decision heuristic.

/// The multiply-with-carry style generator used by MiniSat.
///
/// The engine only needs a cheap, reproducible source of noise, so no external randomness is
/// involved.
pub struct Random {
    seed: f64,
}

impl Random {
    /// Create a generator. The seed must not be zero.
    pub fn new(seed: f64) -> Random {
        debug_assert!(seed != 0.0);
        Random { seed }
    }

    /// Returns a random float 0 <= x < 1. Seed must never be 0.
    pub fn drand(&mut self) -> f64 {
        self.seed *= 1389796.0;
        let q = (self.seed / 2147483647.0) as i32;
        self.seed -= (q as f64) * 2147483647.0;
        self.seed / 2147483647.0
    }

    /// Returns a random integer 0 <= x < size. Seed must never be 0.
    pub fn irand(&mut self, size: usize) -> usize {
        (self.drand() * (size as f64)) as usize
    }

    /// Returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.drand() < p
    }
}
