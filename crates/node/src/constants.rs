use std::time::Duration;

/// The interval between L1 header fetches.
pub(crate) const L1_HEADER_FETCH_INTERVAL: Duration = Duration::from_secs(10);

/// The interval between rollup contract event scans.
pub(crate) const L1_EVENT_SCAN_INTERVAL: Duration = Duration::from_secs(2);

/// The interval between L2 block fetches.
pub(crate) const L2_BLOCK_FETCH_INTERVAL: Duration = Duration::from_secs(2);

/// The interval between chunk proposal attempts.
pub(crate) const CHUNK_PROPOSAL_INTERVAL: Duration = Duration::from_secs(2);

/// The interval between batch proposal attempts.
pub(crate) const BATCH_PROPOSAL_INTERVAL: Duration = Duration::from_secs(10);

/// The interval between L1 base fee oracle updates.
pub(crate) const L1_GAS_ORACLE_INTERVAL: Duration = Duration::from_secs(10);

/// The interval between L2 gas price oracle updates.
pub(crate) const L2_GAS_ORACLE_INTERVAL: Duration = Duration::from_secs(2);

/// The interval between pending batch commit passes.
pub(crate) const PENDING_BATCH_INTERVAL: Duration = Duration::from_secs(2);

/// The interval between committed batch finalization passes.
pub(crate) const COMMITTED_BATCH_INTERVAL: Duration = Duration::from_secs(15);
