use crate::{
    deviates, Confirmation, Layer1RelayerMetrics, RelayerError, TransactionSender, TxContext,
};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use rollup_relayer_db::{Database, DatabaseOperations};
use rollup_relayer_l1::setL1BaseFeeCall;
use std::sync::{Arc, Mutex};

/// The configuration for the [`Layer1Relayer`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Layer1RelayerConfig {
    /// The address of the gas price oracle predeploy on L2.
    pub gas_price_oracle_address: Address,
    /// The floor applied to the relayed base fee, in wei.
    pub min_gas_price: u128,
    /// The minimum deviation from the last relayed base fee, in parts per
    /// thousand, below which an update is skipped.
    pub gas_price_diff: u64,
}

/// The L1 to L2 gas price oracle: relays the L1 base fee into the oracle
/// contract on L2 so L2 can price its L1 data costs.
#[derive(Debug)]
pub struct Layer1Relayer<S> {
    db: Arc<Database>,
    sender: S,
    config: Layer1RelayerConfig,
    last_base_fee: Mutex<Option<u128>>,
    metrics: Layer1RelayerMetrics,
}

impl<S: TransactionSender> Layer1Relayer<S> {
    /// Returns a new relayer over the database and sender.
    pub fn new(db: Arc<Database>, sender: S, config: Layer1RelayerConfig) -> Self {
        Self {
            db,
            sender,
            config,
            last_base_fee: Mutex::new(None),
            metrics: Layer1RelayerMetrics::default(),
        }
    }

    /// Relays the base fee of the newest oracle-pending L1 block, unless it
    /// stays within the configured deviation band of the last relayed value.
    pub async fn process_gas_price_oracle(&self) -> Result<(), RelayerError> {
        let Some(block) = self.db.get_latest_oracle_pending_l1_block().await? else {
            return Ok(());
        };

        let base_fee = u128::from(block.base_fee).max(self.config.min_gas_price);
        let last = *self.last_base_fee.lock().expect("lock poisoned");
        if let Some(last) = last {
            if !deviates(base_fee, last, self.config.gas_price_diff) {
                tracing::debug!(
                    target: "rollup::relayer",
                    block_number = block.number,
                    base_fee,
                    last,
                    "base fee within deviation band, skipping oracle update"
                );
                return Ok(());
            }
        }

        let calldata = setL1BaseFeeCall { new_base_fee: U256::from(base_fee) }.abi_encode();
        let tx_hash = self
            .sender
            .send_transaction(
                TxContext::L1GasOracle(block.number),
                self.config.gas_price_oracle_address,
                calldata.into(),
                None,
            )
            .await?;

        if self.db.set_l1_oracle_importing(block.number, tx_hash).await? {
            *self.last_base_fee.lock().expect("lock poisoned") = Some(base_fee);
            self.metrics.oracle_updates.increment(1);
            self.metrics.last_base_fee.set(base_fee as f64);
            tracing::info!(
                target: "rollup::relayer",
                block_number = block.number,
                base_fee,
                %tx_hash,
                "L1 base fee update submitted"
            );
        }

        Ok(())
    }

    /// Settles the oracle status of the block a confirmation belongs to.
    /// Confirmations for other contexts are ignored.
    pub async fn handle_confirmation(
        &self,
        confirmation: Confirmation,
    ) -> Result<(), RelayerError> {
        let TxContext::L1GasOracle(number) = confirmation.context else {
            return Ok(());
        };

        if !confirmation.success {
            self.metrics.oracle_failures.increment(1);
            tracing::error!(
                target: "rollup::relayer",
                block_number = number,
                tx_hash = %confirmation.tx_hash,
                "L1 base fee update failed"
            );
        }
        self.db.set_l1_oracle_terminal(number, confirmation.success).await?;
        Ok(())
    }
}
