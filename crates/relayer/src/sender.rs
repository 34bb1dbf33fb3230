use alloy_eips::eip4844::{Blob, BlobTransactionSidecar, Bytes48, BYTES_PER_BLOB};
use alloy_json_rpc::RpcError;
use alloy_network::{TransactionBuilder, TransactionBuilder4844};
use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_transport::TransportErrorKind;
use c_kzg::ethereum_kzg_settings;
use std::fmt;
use tokio::sync::mpsc;

/// The capacity of the confirmation channel between a sender and its relayer.
const CONFIRMATION_CHANNEL_SIZE: usize = 256;

/// The purpose a submitted transaction serves, carried through the
/// confirmation channel so the relayer can settle the matching status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxContext {
    /// A `commitBatch` submission for the batch with this hash.
    Commit(B256),
    /// A finalize submission for the batch with this hash.
    Finalize(B256),
    /// A `setL2BaseFee` submission attributed to the batch with this hash.
    L2GasOracle(B256),
    /// A `setL1BaseFee` submission for the L1 block with this number.
    L1GasOracle(u64),
    /// The one-time `importGenesisBatch` submission.
    GenesisImport(B256),
}

impl fmt::Display for TxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit(hash) => write!(f, "commit({hash})"),
            Self::Finalize(hash) => write!(f, "finalize({hash})"),
            Self::L2GasOracle(hash) => write!(f, "l2-gas-oracle({hash})"),
            Self::L1GasOracle(number) => write!(f, "l1-gas-oracle({number})"),
            Self::GenesisImport(hash) => write!(f, "genesis-import({hash})"),
        }
    }
}

/// The terminal outcome of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// The context the transaction was submitted under.
    pub context: TxContext,
    /// The hash of the submitted transaction.
    pub tx_hash: B256,
    /// Whether the transaction was included with a successful receipt.
    pub success: bool,
}

/// An error that occurred submitting a transaction.
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// An error at the RPC transport.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// An error computing the KZG commitment or proof of a blob.
    #[error(transparent)]
    Kzg(#[from] c_kzg::Error),
    /// The blob payload is not a canonical EIP-4844 blob.
    #[error("invalid blob length {0}, expected {BYTES_PER_BLOB}")]
    InvalidBlobLength(usize),
}

/// The submission seam of the relayers.
///
/// Implementations submit the transaction and later push a [`Confirmation`]
/// for it on the channel handed out at construction. At most one transaction
/// should be outstanding per context; nonce management and stuck-transaction
/// escalation are the implementation's concern.
#[async_trait::async_trait]
pub trait TransactionSender: Send + Sync {
    /// Submits a transaction, with a blob sidecar when a blob payload is
    /// given, and returns its hash.
    async fn send_transaction(
        &self,
        context: TxContext,
        to: Address,
        calldata: Bytes,
        blob: Option<&[u8]>,
    ) -> Result<B256, SenderError>;
}

/// A [`TransactionSender`] over an alloy provider. The provider is expected
/// to carry the wallet and fee fillers; this type only shapes the request and
/// watches the receipt.
#[derive(Debug)]
pub struct AlloySender<P> {
    provider: P,
    confirmations: mpsc::Sender<Confirmation>,
}

impl<P> AlloySender<P> {
    /// Returns a new sender over the provider along with the receiving end of
    /// its confirmation channel.
    pub fn new(provider: P) -> (Self, mpsc::Receiver<Confirmation>) {
        let (tx, rx) = mpsc::channel(CONFIRMATION_CHANNEL_SIZE);
        (Self { provider, confirmations: tx }, rx)
    }
}

#[async_trait::async_trait]
impl<P: Provider + 'static> TransactionSender for AlloySender<P> {
    async fn send_transaction(
        &self,
        context: TxContext,
        to: Address,
        calldata: Bytes,
        blob: Option<&[u8]>,
    ) -> Result<B256, SenderError> {
        let mut request = TransactionRequest::default().with_to(to).with_input(calldata);
        if let Some(blob) = blob {
            request = request.with_blob_sidecar(sidecar(blob)?);
        }

        let pending = self.provider.send_transaction(request).await?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(target: "rollup::relayer", %context, %tx_hash, "transaction submitted");

        let confirmations = self.confirmations.clone();
        tokio::spawn(async move {
            let success = match pending.get_receipt().await {
                Ok(receipt) => receipt.status(),
                Err(err) => {
                    tracing::warn!(target: "rollup::relayer", %context, %tx_hash, ?err, "failed to fetch receipt");
                    false
                }
            };
            let _ = confirmations.send(Confirmation { context, tx_hash, success }).await;
        });

        Ok(tx_hash)
    }
}

/// Builds the EIP-4844 sidecar of a canonical blob payload.
fn sidecar(blob: &[u8]) -> Result<BlobTransactionSidecar, SenderError> {
    if blob.len() != BYTES_PER_BLOB {
        return Err(SenderError::InvalidBlobLength(blob.len()));
    }

    let kzg_blob = c_kzg::Blob::from_bytes(blob)?;
    let settings = ethereum_kzg_settings(0);
    let commitment = settings.blob_to_kzg_commitment(&kzg_blob)?;
    let proof = settings.compute_blob_kzg_proof(&kzg_blob, &commitment.to_bytes())?;

    Ok(BlobTransactionSidecar::new(
        vec![Blob::from_slice(blob)],
        vec![Bytes48::from_slice(commitment.to_bytes().as_slice())],
        vec![Bytes48::from_slice(proof.to_bytes().as_slice())],
    ))
}
