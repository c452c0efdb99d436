//! Randomness used to fake backend behavior
//!
//! Handlers never touch an RNG directly; they go through the [`Simulation`]
//! trait so tests can swap in [`ScriptedSimulation`] and get deterministic
//! latency, outcomes and payload values.

use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Source of simulated latency, outcomes and synthetic values
pub trait Simulation: Send + Sync {
    /// Uniform real in `[min, max]`
    fn uniform(&self, min: f64, max: f64) -> f64;

    /// Uniform integer in `[min, max]` (inclusive)
    fn random_int(&self, min: i64, max: i64) -> i64;

    /// `true` with probability `p`
    fn bernoulli(&self, p: f64) -> bool;

    /// Uniform index in `0..len`; `len` must be non-zero
    fn choose_index(&self, len: usize) -> usize;

    /// Uniform duration in `[min, max]`
    fn random_duration(&self, min: Duration, max: Duration) -> Duration {
        let secs = self.uniform(min.as_secs_f64(), max.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Uniformly pick one element of `items`
///
/// Returns `None` for an empty slice.
pub fn choice<'a, T>(simulation: &dyn Simulation, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = simulation.choose_index(items.len()).min(items.len() - 1);
    items.get(index)
}

/// Production simulation backed by the thread-local RNG
///
/// Not seeded; results are not reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSimulation;

impl Simulation for RandomSimulation {
    fn uniform(&self, min: f64, max: f64) -> f64 {
        if min.is_nan() || max.is_nan() || min >= max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }

    fn random_int(&self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }

    fn bernoulli(&self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        rand::rng().random_bool(p.clamp(0.0, 1.0))
    }

    fn choose_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }
}

/// Deterministic simulation that replays queued values
///
/// Each method pops from its own queue. When a queue runs dry the method
/// falls back to a fixed answer: `min` for ranges, `true` for
/// [`bernoulli`](Simulation::bernoulli), `0` for
/// [`choose_index`](Simulation::choose_index). Queued values are clamped into
/// the requested range.
#[derive(Debug, Default)]
pub struct ScriptedSimulation {
    uniforms: Mutex<VecDeque<f64>>,
    ints: Mutex<VecDeque<i64>>,
    outcomes: Mutex<VecDeque<bool>>,
    indices: Mutex<VecDeque<usize>>,
}

impl ScriptedSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values returned by `uniform` (and so `random_duration`, in seconds)
    pub fn with_uniforms(self, values: impl IntoIterator<Item = f64>) -> Self {
        push_all(&self.uniforms, values);
        self
    }

    /// Values returned by `random_int`
    pub fn with_ints(self, values: impl IntoIterator<Item = i64>) -> Self {
        push_all(&self.ints, values);
        self
    }

    /// Values returned by `bernoulli`
    pub fn with_outcomes(self, values: impl IntoIterator<Item = bool>) -> Self {
        push_all(&self.outcomes, values);
        self
    }

    /// Values returned by `choose_index`
    pub fn with_indices(self, values: impl IntoIterator<Item = usize>) -> Self {
        push_all(&self.indices, values);
        self
    }
}

fn push_all<T>(queue: &Mutex<VecDeque<T>>, values: impl IntoIterator<Item = T>) {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .extend(values);
}

fn pop<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}

impl Simulation for ScriptedSimulation {
    fn uniform(&self, min: f64, max: f64) -> f64 {
        pop(&self.uniforms).map_or(min, |v| v.clamp(min, max.max(min)))
    }

    fn random_int(&self, min: i64, max: i64) -> i64 {
        pop(&self.ints).map_or(min, |v| v.clamp(min, max.max(min)))
    }

    fn bernoulli(&self, _p: f64) -> bool {
        pop(&self.outcomes).unwrap_or(true)
    }

    fn choose_index(&self, len: usize) -> usize {
        pop(&self.indices).map_or(0, |i| i.min(len.saturating_sub(1)))
    }
}
