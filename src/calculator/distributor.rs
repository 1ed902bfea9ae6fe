//! Splits a run count across a fixed number of workers.

use std::sync::{Mutex, PoisonError};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributorError {
    #[error("parallelism must be at least 1, got {0}")]
    InvalidParallelism(i32),
    #[error("every worker has already taken its share of runs")]
    Exhausted,
}

#[derive(Debug)]
struct Remaining {
    runs: u32,
    workers: u32,
}

/// Hands each of `parallelism` workers its share of the runs.
///
/// Every call to [`next_run_count`](Self::next_run_count) takes the ceiling
/// of the runs still unassigned over the workers still waiting, so the
/// shares differ by at most one, larger shares come first, and the shares
/// always add up to the total.
#[derive(Debug)]
pub struct RunCountDistributor {
    remaining: Mutex<Remaining>,
}

impl RunCountDistributor {
    pub fn new(total_runs: u32, parallelism: i32) -> Result<Self, DistributorError> {
        if parallelism < 1 {
            return Err(DistributorError::InvalidParallelism(parallelism));
        }
        Ok(RunCountDistributor {
            remaining: Mutex::new(Remaining {
                runs: total_runs,
                workers: parallelism as u32,
            }),
        })
    }

    /// Claims the next worker's share. Fails once all workers have claimed.
    pub fn next_run_count(&self) -> Result<u32, DistributorError> {
        let mut remaining = self.remaining.lock().unwrap_or_else(PoisonError::into_inner);
        if remaining.workers == 0 {
            return Err(DistributorError::Exhausted);
        }
        let share = remaining.runs.div_ceil(remaining.workers);
        remaining.runs -= share;
        remaining.workers -= 1;
        Ok(share)
    }

    pub fn remaining_workers(&self) -> u32 {
        self.remaining
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .workers
    }
}
