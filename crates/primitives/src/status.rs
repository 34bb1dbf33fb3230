use serde::{Deserialize, Serialize};
use std::fmt;

/// The error returned when a stored status discriminant is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status discriminant: {value}")]
pub struct StatusConversionError {
    /// The status kind the value was decoded for.
    pub kind: &'static str,
    /// The offending discriminant.
    pub value: i16,
}

macro_rules! db_status {
    ($(#[$doc:meta])* $name:ident, $kind:literal, { $($(#[$vdoc:meta])* $variant:ident = $value:literal => $display:literal,)+ }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        #[repr(i16)]
        pub enum $name {
            $($(#[$vdoc])* $variant = $value,)+
        }

        impl From<$name> for i16 {
            fn from(status: $name) -> Self {
                status as Self
            }
        }

        impl TryFrom<i16> for $name {
            type Error = StatusConversionError;

            fn try_from(value: i16) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(StatusConversionError { kind: $kind, value }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($display),)+
                }
            }
        }
    };
}

db_status!(
    /// The L1 lifecycle of a batch.
    ///
    /// Forward transitions are `Pending → Committing → Committed → Finalizing →
    /// Finalized`. `Reverted` is terminal and reachable from any in-flight
    /// state. `CommitFailed` and `FinalizeFailed` record a confirmed but failed
    /// transaction and are retried by the respective relayer loop.
    RollupStatus, "rollup", {
        /// The batch is waiting to be committed.
        Pending = 1 => "pending",
        /// The commit transaction has been submitted.
        Committing = 2 => "committing",
        /// The commit event has been observed on L1.
        Committed = 3 => "committed",
        /// The finalize transaction has been submitted.
        Finalizing = 4 => "finalizing",
        /// The finalize event has been observed on L1.
        Finalized = 5 => "finalized",
        /// The commit transaction confirmed but failed.
        CommitFailed = 6 => "commit_failed",
        /// The finalize transaction confirmed but failed.
        FinalizeFailed = 7 => "finalize_failed",
        /// The batch was reverted on L1.
        Reverted = 8 => "reverted",
    }
);

db_status!(
    /// The lifecycle of a gas price oracle update.
    GasOracleStatus, "gas oracle", {
        /// The record is waiting for an oracle update.
        Pending = 1 => "pending",
        /// The oracle update transaction has been submitted.
        Importing = 2 => "importing",
        /// The oracle update transaction confirmed successfully.
        Imported = 3 => "imported",
        /// The oracle update transaction confirmed but failed.
        Failed = 4 => "failed",
    }
);

db_status!(
    /// The proving lifecycle of a chunk or batch. Opaque to this service
    /// except as a finalization gate.
    ProvingStatus, "proving", {
        /// No prover has been assigned.
        Unassigned = 1 => "unassigned",
        /// A prover has been assigned.
        Assigned = 2 => "assigned",
        /// A proof has been returned.
        Proved = 3 => "proved",
        /// The proof has been verified.
        Verified = 4 => "verified",
        /// Proof generation failed.
        Failed = 5 => "failed",
    }
);

impl Default for RollupStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for GasOracleStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl Default for ProvingStatus {
    fn default() -> Self {
        Self::Unassigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollup_status_roundtrips_through_i16() {
        for status in [
            RollupStatus::Pending,
            RollupStatus::Committing,
            RollupStatus::Committed,
            RollupStatus::Finalizing,
            RollupStatus::Finalized,
            RollupStatus::CommitFailed,
            RollupStatus::FinalizeFailed,
            RollupStatus::Reverted,
        ] {
            assert_eq!(RollupStatus::try_from(i16::from(status)), Ok(status));
        }
        assert!(RollupStatus::try_from(0).is_err());
        assert!(RollupStatus::try_from(9).is_err());
    }

    #[test]
    fn statuses_display_their_stored_names() {
        assert_eq!(RollupStatus::CommitFailed.to_string(), "commit_failed");
        assert_eq!(GasOracleStatus::Importing.to_string(), "importing");
        assert_eq!(ProvingStatus::Verified.to_string(), "verified");
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&RollupStatus::FinalizeFailed).unwrap(), "\"finalize_failed\"");
        assert_eq!(
            serde_json::from_str::<GasOracleStatus>("\"imported\"").unwrap(),
            GasOracleStatus::Imported
        );
    }
}
