use alloy_primitives::B256;
use rollup_relayer_core::{Layer1RelayerConfig, Layer2RelayerConfig};
use rollup_relayer_primitives::{BlockHeaderInfo, L2Block};
use rollup_relayer_proposer::{BatchProposerConfig, ChunkProposerConfig};
use rollup_relayer_watcher::{L1WatcherConfig, L2WatcherConfig};
use std::{net::SocketAddr, path::Path};

/// The configuration of the rollup relayer, loaded from a JSON file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub(crate) struct NodeConfig {
    /// The database connection string.
    pub(crate) database_url: String,
    /// The RPC endpoint of an L1 execution node.
    pub(crate) l1_rpc_url: String,
    /// The RPC endpoint of the L2 execution node.
    pub(crate) l2_rpc_url: String,
    /// The hex-encoded private key submitting transactions on both layers.
    pub(crate) private_key: Option<String>,
    /// The codec version new chunks and batches are encoded with.
    pub(crate) codec_version: u8,
    /// The Prometheus listener address.
    pub(crate) metrics_addr: Option<SocketAddr>,
    /// The L2 genesis header, imported as batch 0 on first startup.
    pub(crate) genesis: GenesisConfig,
    /// The L1 watcher configuration.
    pub(crate) l1_watcher: L1WatcherConfig,
    /// The L2 watcher configuration.
    pub(crate) l2_watcher: L2WatcherConfig,
    /// The chunk proposer configuration.
    pub(crate) chunk_proposer: ChunkProposerConfig,
    /// The batch proposer configuration.
    pub(crate) batch_proposer: BatchProposerConfig,
    /// The L1 gas price oracle configuration.
    pub(crate) l1_relayer: Layer1RelayerConfig,
    /// The L2 relayer configuration.
    pub(crate) l2_relayer: Layer2RelayerConfig,
}

impl NodeConfig {
    /// Loads the configuration from a JSON file.
    pub(crate) fn from_file(path: &Path) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// The fields of the L2 genesis header the genesis import needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub(crate) struct GenesisConfig {
    /// The genesis block hash.
    pub(crate) hash: B256,
    /// The genesis state root.
    pub(crate) state_root: B256,
    /// The genesis timestamp.
    pub(crate) timestamp: u64,
}

impl GenesisConfig {
    /// Returns the genesis header as an empty L2 block.
    pub(crate) fn block(&self) -> L2Block {
        L2Block {
            header: BlockHeaderInfo {
                number: 0,
                hash: self.hash,
                parent_hash: B256::ZERO,
                timestamp: self.timestamp,
                base_fee: None,
                gas_limit: 0,
                state_root: self.state_root,
            },
            transactions: vec![],
            withdraw_root: B256::ZERO,
            row_consumption: vec![],
        }
    }
}
