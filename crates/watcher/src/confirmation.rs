use crate::{ChainReader, WatcherError};

use alloy_rpc_types_eth::BlockNumberOrTag;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// The confirmation policy used before a block is considered safe to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPolicy {
    /// Wait for the provided number of confirmations on top of a block.
    Number(u64),
    /// Act on the latest block.
    Latest,
    /// Act on the safe block.
    Safe,
    /// Act on the finalized block.
    Finalized,
    /// Act on the earliest block.
    Earliest,
    /// Act on the pending block.
    Pending,
}

impl fmt::Display for ConfirmationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(depth) => write!(f, "number={depth}"),
            Self::Latest => write!(f, "latest"),
            Self::Safe => write!(f, "safe"),
            Self::Finalized => write!(f, "finalized"),
            Self::Earliest => write!(f, "earliest"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for ConfirmationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latest" => Ok(Self::Latest),
            "safe" => Ok(Self::Safe),
            "finalized" => Ok(Self::Finalized),
            "earliest" => Ok(Self::Earliest),
            "pending" => Ok(Self::Pending),
            other => {
                let depth = other
                    .strip_prefix("number=")
                    .ok_or_else(|| format!("invalid confirmation policy: {other}"))?;
                depth
                    .parse()
                    .map(Self::Number)
                    .map_err(|err| format!("invalid confirmation depth {depth}: {err}"))
            }
        }
    }
}

impl Serialize for ConfirmationPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConfirmationPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Returns the highest block number considered confirmed under the provided
/// policy.
///
/// Tag policies delegate to the node verbatim. A depth policy subtracts the
/// depth from the latest block number, clamping at zero.
pub async fn latest_confirmed_block_number<R>(
    reader: &R,
    policy: ConfirmationPolicy,
) -> Result<u64, WatcherError>
where
    R: ChainReader + ?Sized,
{
    match policy {
        ConfirmationPolicy::Number(depth) => {
            let latest = reader.block_number(BlockNumberOrTag::Latest).await?;
            Ok(latest.saturating_sub(depth))
        }
        ConfirmationPolicy::Latest => reader.block_number(BlockNumberOrTag::Latest).await,
        ConfirmationPolicy::Safe => reader.block_number(BlockNumberOrTag::Safe).await,
        ConfirmationPolicy::Finalized => reader.block_number(BlockNumberOrTag::Finalized).await,
        ConfirmationPolicy::Earliest => reader.block_number(BlockNumberOrTag::Earliest).await,
        ConfirmationPolicy::Pending => reader.block_number(BlockNumberOrTag::Pending).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChainReader;

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("number=6".parse::<ConfirmationPolicy>().unwrap(), ConfirmationPolicy::Number(6));
        assert_eq!("safe".parse::<ConfirmationPolicy>().unwrap(), ConfirmationPolicy::Safe);
        assert_eq!(
            "finalized".parse::<ConfirmationPolicy>().unwrap(),
            ConfirmationPolicy::Finalized
        );
        assert!("number=".parse::<ConfirmationPolicy>().is_err());
        assert!("confirmed".parse::<ConfirmationPolicy>().is_err());
    }

    #[test]
    fn policy_serde_roundtrips() {
        let policy: ConfirmationPolicy = serde_json::from_str("\"number=12\"").unwrap();
        assert_eq!(policy, ConfirmationPolicy::Number(12));
        assert_eq!(serde_json::to_string(&policy).unwrap(), "\"number=12\"");
    }

    #[tokio::test]
    async fn depth_policy_clamps_at_zero() -> eyre::Result<()> {
        let reader = MockChainReader::default().with_latest(5);

        // depth larger than the head clamps to zero instead of underflowing.
        let confirmed =
            latest_confirmed_block_number(&reader, ConfirmationPolicy::Number(6)).await?;
        assert_eq!(confirmed, 0);

        let confirmed =
            latest_confirmed_block_number(&reader, ConfirmationPolicy::Number(2)).await?;
        assert_eq!(confirmed, 3);

        Ok(())
    }

    #[tokio::test]
    async fn tag_policies_delegate_verbatim() -> eyre::Result<()> {
        let reader = MockChainReader::default().with_latest(100).with_safe(64).with_finalized(32);

        assert_eq!(latest_confirmed_block_number(&reader, ConfirmationPolicy::Safe).await?, 64);
        assert_eq!(
            latest_confirmed_block_number(&reader, ConfirmationPolicy::Finalized).await?,
            32
        );
        assert_eq!(latest_confirmed_block_number(&reader, ConfirmationPolicy::Latest).await?, 100);

        Ok(())
    }
}
