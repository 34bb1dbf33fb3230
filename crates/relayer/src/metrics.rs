use metrics::{Counter, Gauge};
use metrics_derive::Metrics;

/// The metrics for the [`super::Layer1Relayer`].
#[derive(Metrics)]
#[metrics(scope = "l1_relayer")]
pub struct Layer1RelayerMetrics {
    /// A counter on the L1 base fee updates submitted.
    pub oracle_updates: Counter,
    /// A counter on the oracle submissions confirmed as failed.
    pub oracle_failures: Counter,
    /// The last L1 base fee relayed, in wei.
    pub last_base_fee: Gauge,
}

/// The metrics for the [`super::Layer2Relayer`].
#[derive(Metrics)]
#[metrics(scope = "l2_relayer")]
pub struct Layer2RelayerMetrics {
    /// A counter on the L2 gas price updates submitted.
    pub oracle_updates: Counter,
    /// A counter on the commit transactions submitted.
    pub commits_sent: Counter,
    /// A counter on the finalize transactions submitted.
    pub finalizes_sent: Counter,
    /// A counter on the commit submissions confirmed as failed.
    pub commit_failures: Counter,
    /// A counter on the finalize submissions confirmed as failed.
    pub finalize_failures: Counter,
}
