//! Seedable randomness for fallback payloads.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub struct Jitter {
    /// Max absolute offset applied by `score`.
    amplitude: u8,
    rng: Mutex<StdRng>,
}

impl Jitter {
    pub fn new(amplitude: u8, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            amplitude,
            rng: Mutex::new(rng),
        }
    }

    /// No offsets, fixed seed. Used where fallbacks must be reproducible.
    pub fn disabled() -> Self {
        Self::new(0, Some(0))
    }

    /// `base` plus a uniform offset in `-amplitude..=amplitude`, clamped to 0..=100.
    pub fn score(&self, base: i32) -> u8 {
        let offset = if self.amplitude == 0 {
            0
        } else {
            let a = i32::from(self.amplitude);
            self.with_rng(|rng| rng.gen_range(-a..=a))
        };
        (base + offset).clamp(0, 100) as u8
    }

    /// Uniform integer in `low..=high`.
    pub fn range(&self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.with_rng(|rng| rng.gen_range(low..=high))
    }

    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.with_rng(|rng| items.choose(rng))
    }

    fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        // A poisoned lock still holds a usable RNG.
        let mut guard = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }
}
