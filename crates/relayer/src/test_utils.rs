//! Test utilities for exercising the relayers without a network.

use crate::{Confirmation, SenderError, TransactionSender, TxContext};
use alloy_primitives::{keccak256, Address, Bytes, B256};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// A transaction recorded by the [`MockSender`].
#[derive(Debug, Clone)]
pub struct SentTransaction {
    /// The context the transaction was submitted under.
    pub context: TxContext,
    /// The target contract.
    pub to: Address,
    /// The call data.
    pub calldata: Bytes,
    /// The blob payload, when one was attached.
    pub blob: Option<Vec<u8>>,
}

/// A [`TransactionSender`] that records submissions and hands out
/// confirmations on demand.
#[derive(Debug, Clone, Default)]
pub struct MockSender {
    inner: Arc<Mutex<MockSenderInner>>,
}

#[derive(Debug, Default)]
struct MockSenderInner {
    sent: Vec<SentTransaction>,
    tx_hashes: HashMap<TxContext, B256>,
}

impl MockSender {
    /// Returns a new empty sender.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all transactions submitted so far.
    pub fn sent(&self) -> Vec<SentTransaction> {
        self.inner.lock().expect("lock poisoned").sent.clone()
    }

    /// Returns a confirmation for the last transaction submitted under the
    /// context.
    ///
    /// # Panics
    ///
    /// Panics if no transaction was submitted under the context.
    pub fn confirmation(&self, context: TxContext, success: bool) -> Confirmation {
        let tx_hash = *self
            .inner
            .lock()
            .expect("lock poisoned")
            .tx_hashes
            .get(&context)
            .expect("no transaction submitted under this context");
        Confirmation { context, tx_hash, success }
    }
}

#[async_trait::async_trait]
impl TransactionSender for MockSender {
    async fn send_transaction(
        &self,
        context: TxContext,
        to: Address,
        calldata: Bytes,
        blob: Option<&[u8]>,
    ) -> Result<B256, SenderError> {
        let mut inner = self.inner.lock().expect("lock poisoned");
        let mut preimage = (inner.sent.len() as u64).to_be_bytes().to_vec();
        preimage.extend_from_slice(&calldata);
        let tx_hash = keccak256(&preimage);
        inner.sent.push(SentTransaction {
            context,
            to,
            calldata,
            blob: blob.map(<[u8]>::to_vec),
        });
        inner.tx_hashes.insert(context, tx_hash);
        Ok(tx_hash)
    }
}
