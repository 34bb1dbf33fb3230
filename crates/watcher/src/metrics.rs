use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics for the [`super::L1Watcher`].
#[derive(Metrics)]
#[metrics(scope = "l1_watcher")]
pub struct L1WatcherMetrics {
    /// A counter on the L1 headers ingested.
    pub headers_ingested: Counter,
    /// A counter on the batch commit events processed.
    pub commit_events: Counter,
    /// A counter on the batch finalize events processed.
    pub finalize_events: Counter,
    /// A counter on the batch revert events processed.
    pub revert_events: Counter,
    /// A counter on the events skipped for unknown batches.
    pub skipped_events: Counter,
    /// The highest L1 block scanned for contract events.
    pub event_scan_height: Gauge,
}

/// The metrics for the [`super::L2Watcher`].
#[derive(Metrics)]
#[metrics(scope = "l2_watcher")]
pub struct L2WatcherMetrics {
    /// A counter on the L2 blocks fetched.
    pub blocks_fetched: Counter,
    /// The highest L2 block persisted.
    pub fetch_height: Gauge,
}
