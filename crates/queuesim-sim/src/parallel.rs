//! Runs a batch of independent simulations across a `rayon` thread pool.
//!
//! Each run owns its own `Simulator` and everything it needs: there is no
//! shared mutable state between runs, so results are simply collected, not
//! merged under a lock. A panicking run is caught and reported with its
//! index rather than taking down the whole batch.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use queuesim_core::kernel::Simulator;

/// One run's failure: either a panic (message extracted where possible) or
/// a model-builder error surfaced as a plain string.
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run {} failed: {}", self.index, self.message)
    }
}

impl std::error::Error for RunFailure {}

/// Build and run every description in `descriptions` concurrently,
/// returning one result per input, in input order. Each description is a
/// thunk that builds a `Simulator` and its model, runs it, and returns
/// both; nothing is shared between thunks.
pub fn run_all<M, F>(descriptions: Vec<F>) -> Vec<Result<(M, Simulator), RunFailure>>
where
    M: Send,
    F: FnOnce() -> (M, Simulator) + Send,
{
    log::info!("starting parallel batch of {} runs", descriptions.len());
    let results: Vec<Result<(M, Simulator), RunFailure>> = descriptions
        .into_par_iter()
        .enumerate()
        .map(|(index, thunk)| {
            panic::catch_unwind(AssertUnwindSafe(thunk)).map_err(|payload| {
                let message = panic_message(&payload);
                log::warn!("run {index} panicked: {message}");
                RunFailure { index, message }
            })
        })
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    log::info!(
        "parallel batch complete: {} ok, {} failed",
        results.len() - failed,
        failed
    );
    results
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
