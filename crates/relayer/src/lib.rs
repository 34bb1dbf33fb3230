//! The relayer halves of the rollup node: the L1 to L2 gas price oracle and
//! the L2 side that commits and finalizes batches on the rollup contract.
//!
//! Both relayers submit through a [`TransactionSender`] and learn the outcome
//! of their submissions from its confirmation channel. The authoritative
//! `Committed` and `Finalized` transitions still come from L1 events; the
//! confirmation handlers only record failures and settle the oracle statuses.

mod error;
pub use error::RelayerError;

mod l1;
pub use l1::{Layer1Relayer, Layer1RelayerConfig};

mod l2;
pub use l2::{Layer2Relayer, Layer2RelayerConfig};

mod metrics;
pub use metrics::{Layer1RelayerMetrics, Layer2RelayerMetrics};

mod sender;
pub use sender::{AlloySender, Confirmation, SenderError, TransactionSender, TxContext};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_secs()).unwrap_or(0)
}

/// Returns whether `price` deviates from `last` by at least `diff_permille`
/// parts per thousand.
pub(crate) fn deviates(price: u128, last: u128, diff_permille: u64) -> bool {
    price.abs_diff(last) * 1000 >= last * u128::from(diff_permille)
}
