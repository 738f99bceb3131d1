//! Random sources for fault injection.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// A source of uniform random values in `[0, 1)`.
///
/// The transport draws from this to decide latency and failure, so tests
/// can force either branch.
pub trait RandomSource: Send + Sync {
    /// Returns the next value in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// A reproducible RNG seeded once.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }
}

/// Replays a fixed sequence of values, then repeats the last one.
#[derive(Debug)]
pub struct ScriptedRandom {
    values: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl ScriptedRandom {
    /// Creates a source that yields `values` in order.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().map(clamp_unit).collect()),
            last: Mutex::new(0.0),
        }
    }

    /// Creates a source that always yields `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([value])
    }

    /// Appends values to the script.
    pub fn push(&self, values: impl IntoIterator<Item = f64>) {
        self.values.lock().extend(values.into_iter().map(clamp_unit));
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        let mut last = self.last.lock();
        if let Some(value) = self.values.lock().pop_front() {
            *last = value;
        }
        *last
    }
}

fn clamp_unit(value: f64) -> f64 {
    // Largest f64 below 1.0 keeps the half-open range.
    value.clamp(0.0, 1.0 - f64::EPSILON)
}
