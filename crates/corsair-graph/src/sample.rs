//! Uniform random sampling over labels, and the process-wide tally counter.
//!
//! The random source is injectable: production uses an entropy-seeded
//! `StdRng`, tests pin a seed and get reproducible picks. The RNG sits
//! behind a mutex so the sampler can be shared across request handlers; the
//! critical section is a single `gen_range` call.
//!
//! The tally counter is the one piece of mutable process state in the whole
//! engine. The source system bumped an unguarded global here; an atomic
//! closes that race.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GraphError;
use crate::model::{Label, Node};
use crate::query::QueryEngine;

pub struct Sampler {
    engine: QueryEngine,
    rng: Mutex<StdRng>,
}

impl Sampler {
    pub fn new(engine: QueryEngine) -> Self {
        Self {
            engine,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sampler for tests and reproducible runs.
    pub fn with_seed(engine: QueryEngine, seed: u64) -> Self {
        Self {
            engine,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// One node of `label`, chosen with equal probability.
    pub fn pick(&self, label: Label) -> Result<Node, GraphError> {
        self.pick_where(label, |_| true)
    }

    /// One node of `label` satisfying `predicate`, chosen with equal
    /// probability over the satisfying subset.
    pub fn pick_where(
        &self,
        label: Label,
        predicate: impl Fn(&Node) -> bool,
    ) -> Result<Node, GraphError> {
        let candidates: Vec<&Node> = self
            .engine
            .nodes_of(label)
            .filter(|n| predicate(n))
            .collect();
        if candidates.is_empty() {
            return Err(GraphError::EmptyCollection { label });
        }
        let idx = self
            .rng
            .lock()
            .expect("sampler rng poisoned")
            .gen_range(0..candidates.len());
        Ok(candidates[idx].clone())
    }
}

/// Monotone counter bumped by a narrative side-feature. No persistence
/// contract; resets on restart. `increment` returns the post-increment
/// value so concurrent callers each observe a distinct count.
#[derive(Debug, Default)]
pub struct TallyCounter(AtomicU64);

impl TallyCounter {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn read(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
