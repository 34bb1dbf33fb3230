//! L1 and L2 chain watchers for the rollup relayer.

mod chain;
pub use chain::{AlloyChainReader, ChainReader, HeaderInfo, L2BlockData};

mod confirmation;
pub use confirmation::{latest_confirmed_block_number, ConfirmationPolicy};

mod error;
pub use error::WatcherError;

mod l1;
pub use l1::{L1Watcher, L1WatcherConfig};

mod l2;
pub use l2::{L2Watcher, L2WatcherConfig};

mod metrics;
pub use metrics::{L1WatcherMetrics, L2WatcherMetrics};

#[cfg(any(test, feature = "test-utils"))]
/// Common test helpers.
pub mod test_utils;
