//! Batch recompute of independent requests.
//!
//! Engines share no state, so requests can be spread over the rayon pool.
//! Results come back in request order either way.

use am_io::loader::CalculationRequest;
use rayon::prelude::*;
use tracing::debug;

use crate::{recalculate, EndResult, PipelineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallel {
    /// One request after the other on the calling thread.
    No,
    /// Spread over the global rayon pool.
    #[default]
    Rayon,
}

pub fn recalculate_all(
    requests: Vec<CalculationRequest>,
    parallel: Parallel,
) -> Vec<Result<EndResult, PipelineError>> {
    debug!(requests = requests.len(), ?parallel, "batch recompute");
    match parallel {
        Parallel::No => requests.into_iter().map(recalculate).collect(),
        Parallel::Rayon => requests.into_par_iter().map(recalculate).collect(),
    }
}
