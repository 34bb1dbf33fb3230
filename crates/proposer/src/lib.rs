//! Chunk and batch proposers for the rollup relayer.
//!
//! Both proposers run the same greedy single pass: include the next candidate,
//! recompute the resource metrics through the codec, and stop before the first
//! item that breaches a ceiling. A first item that breaches on its own is
//! force-included as a one-item proposal so the pipeline never stalls.

mod batch;
pub use batch::{BatchProposer, BatchProposerConfig};

mod chunk;
pub use chunk::{ChunkProposer, ChunkProposerConfig};

mod error;
pub use error::ProposerError;

mod metrics;
pub use metrics::{BatchProposerMetrics, ChunkProposerMetrics};

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_secs()).unwrap_or(0)
}
