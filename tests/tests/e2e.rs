//! Drives ten L2 blocks through the whole pipeline over an in-memory store:
//! watcher ingestion, chunk and batch proposal, commit, proof gating and
//! finalization, with the rollup contract events applied by the L1 watcher.

use alloy_primitives::{Address, B256, U256};
use rollup_relayer_codec::CodecVersion;
use rollup_relayer_core::{
    test_utils::MockSender, Layer2Relayer, Layer2RelayerConfig, TxContext,
};
use rollup_relayer_db::{test_utils::setup_test_db, DatabaseOperations};
use rollup_relayer_l1::{CommitBatch, FinalizeBatch};
use rollup_relayer_primitives::{BlockHeaderInfo, L2Block, ProvingStatus, RollupStatus};
use rollup_relayer_proposer::{
    BatchProposer, BatchProposerConfig, ChunkProposer, ChunkProposerConfig,
};
use rollup_relayer_watcher::{
    test_utils::{event_log, test_l2_block, MockChainReader},
    ConfirmationPolicy, L1Watcher, L1WatcherConfig, L2Watcher, L2WatcherConfig,
};
use std::sync::Arc;

fn genesis() -> L2Block {
    L2Block {
        header: BlockHeaderInfo {
            number: 0,
            hash: B256::random(),
            parent_hash: B256::ZERO,
            timestamp: 1_700_000_000,
            base_fee: None,
            gas_limit: 0,
            state_root: B256::random(),
        },
        transactions: vec![],
        withdraw_root: B256::ZERO,
        row_consumption: vec![],
    }
}

#[tokio::test]
async fn test_ten_blocks_reach_finalized() -> eyre::Result<()> {
    let db = Arc::new(setup_test_db().await);
    let rollup_contract = Address::random();

    // genesis import seeds chunk 0 and batch 0.
    let sender = MockSender::new();
    let relayer = Layer2Relayer::new(
        db.clone(),
        MockChainReader::default().with_gas_price(1_000),
        sender.clone(),
        Layer2RelayerConfig {
            rollup_contract_address: rollup_contract,
            gas_price_oracle_address: Address::random(),
            min_gas_price: 0,
            gas_price_diff: 50,
            finalize_without_proof_after_sec: None,
        },
    );
    relayer.import_genesis(&genesis()).await?;

    // ten blocks arrive on L2.
    let mut l2_reader = MockChainReader::default().with_latest(10);
    for number in 1..=10 {
        l2_reader = l2_reader.with_l2_block(test_l2_block(number));
    }
    let l2_watcher = L2Watcher::new(
        l2_reader,
        db.clone(),
        L2WatcherConfig {
            start_height: 0,
            confirmation: ConfirmationPolicy::Latest,
            message_queue_address: Address::random(),
            withdraw_trie_root_slot: B256::ZERO,
        },
    );
    l2_watcher.try_fetch_running_missing_blocks().await?;
    assert_eq!(db.get_latest_l2_block_number().await?, Some(10));

    // two five-block chunks, then one batch over both.
    let chunk_proposer = ChunkProposer::new(
        db.clone(),
        CodecVersion::V1,
        ChunkProposerConfig {
            max_block_num_per_chunk: 5,
            max_tx_num_per_chunk: 10_000,
            max_l1_commit_gas_per_chunk: 50_000_000,
            max_l1_commit_calldata_size_per_chunk: 1_000_000,
            max_row_consumption_per_chunk: 1_000_000,
            max_blob_size_per_chunk: 131_072,
            chunk_timeout_sec: 0,
            gas_cost_increase_multiplier: 1.2,
        },
    );
    chunk_proposer.try_propose_chunk().await?;
    chunk_proposer.try_propose_chunk().await?;
    let chunk = db.get_latest_chunk().await?.unwrap();
    assert_eq!(chunk.index, 2);
    assert_eq!((chunk.start_block_number, chunk.end_block_number), (6, 10));

    let batch_proposer = BatchProposer::new(
        db.clone(),
        CodecVersion::V1,
        BatchProposerConfig {
            max_chunk_num_per_batch: 15,
            max_l1_commit_gas_per_batch: 50_000_000,
            max_l1_commit_calldata_size_per_batch: 1_000_000,
            max_blob_size_per_batch: 131_072,
            batch_timeout_sec: 0,
            gas_cost_increase_multiplier: 1.2,
        },
    );
    batch_proposer.try_propose_batch().await?;
    let batch = db.get_latest_batch().await?.unwrap();
    assert_eq!(batch.index, 1);
    assert_eq!((batch.start_chunk_index, batch.end_chunk_index), (1, 2));
    assert_eq!(batch.rollup_status, RollupStatus::Pending);

    // the relayer commits the batch on L1.
    relayer.process_pending_batches().await?;
    let committing = db.get_batch_by_hash(batch.hash).await?.unwrap();
    assert_eq!(committing.rollup_status, RollupStatus::Committing);
    relayer
        .handle_confirmation(sender.confirmation(TxContext::Commit(batch.hash), true))
        .await?;

    // the rollup contract event is authoritative for `Committed`.
    let commit_log = event_log(
        &CommitBatch { batch_index: U256::from(1u64), batch_hash: batch.hash },
        rollup_contract,
        50,
        committing.commit_tx_hash.unwrap(),
        1_700_000_100,
    );
    let l1_config = L1WatcherConfig {
        rollup_contract_address: rollup_contract,
        start_height: 0,
        confirmation: ConfirmationPolicy::Latest,
        contract_events_block_range: 1_000,
    };
    let l1_watcher = L1Watcher::new(
        MockChainReader::default().with_latest(100).with_log(commit_log.clone()),
        db.clone(),
        l1_config.clone(),
    );
    l1_watcher.fetch_contract_events().await?;
    let committed = db.get_batch_by_hash(batch.hash).await?.unwrap();
    assert_eq!(committed.rollup_status, RollupStatus::Committed);
    assert_eq!(committed.committed_at, Some(1_700_000_100));

    // no verified proof, no finalization.
    relayer.process_committed_batches().await?;
    assert_eq!(
        db.get_batch_by_hash(batch.hash).await?.unwrap().rollup_status,
        RollupStatus::Committed
    );

    // the proof arrives and the finalize transaction goes out.
    db.update_batch_proving_status(batch.hash, ProvingStatus::Verified).await?;
    relayer.process_committed_batches().await?;
    let finalizing = db.get_batch_by_hash(batch.hash).await?.unwrap();
    assert_eq!(finalizing.rollup_status, RollupStatus::Finalizing);
    relayer
        .handle_confirmation(sender.confirmation(TxContext::Finalize(batch.hash), true))
        .await?;

    // the finalize event lands; the replayed commit event is a no-op.
    let finalize_log = event_log(
        &FinalizeBatch {
            batch_index: U256::from(1u64),
            batch_hash: batch.hash,
            state_root: finalizing.state_root,
            withdraw_root: finalizing.withdraw_root,
        },
        rollup_contract,
        150,
        finalizing.finalize_tx_hash.unwrap(),
        1_700_000_200,
    );
    let l1_watcher = L1Watcher::new(
        MockChainReader::default()
            .with_latest(200)
            .with_log(commit_log)
            .with_log(finalize_log),
        db.clone(),
        l1_config,
    );
    l1_watcher.fetch_contract_events().await?;

    let finalized = db.get_batch_by_hash(batch.hash).await?.unwrap();
    assert_eq!(finalized.rollup_status, RollupStatus::Finalized);
    assert_eq!(finalized.finalized_at, Some(1_700_000_200));

    // every block is chunked and every chunk is batched.
    assert!(db.get_unchunked_blocks(100).await?.is_empty());
    assert!(db.get_unbatched_chunks(100).await?.is_empty());

    Ok(())
}
