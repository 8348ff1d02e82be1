use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Source of the match's randomness: the roulette winner and automated
/// mistake draws. Tests swap in scripted implementations.
pub trait RandomSource: Send {
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform value in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Seed to replay this source from, if it has one.
    fn seed(&self) -> Option<u64> {
        None
    }
}

/// ChaCha20-backed source. The same seed replays the same match.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: ChaCha20Rng,
    seed: Option<u64>,
}

impl SeededRng {
    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_os() -> Self {
        Self {
            rng: ChaCha20Rng::from_os_rng(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, otherwise drawn from the OS.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new_with_seed(seed),
            None => Self::from_os(),
        }
    }
}

impl RandomSource for SeededRng {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn seed(&self) -> Option<u64> {
        self.seed
    }
}
