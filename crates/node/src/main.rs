//! The rollup relayer binary.
//!
//! Wires the watchers, proposers and relayers over one database and spawns an
//! independent interval loop per component. Loops log their own errors; only
//! startup failures are fatal.

mod args;
mod config;
mod constants;

use crate::{args::NodeArgs, config::NodeConfig};
use alloy_network::EthereumWallet;
use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use rollup_relayer_codec::CodecVersion;
use rollup_relayer_core::{AlloySender, Confirmation, Layer1Relayer, Layer2Relayer};
use rollup_relayer_db::{Database, DatabaseConnectionProvider};
use rollup_relayer_migration::{Migrator, MigratorTrait};
use rollup_relayer_proposer::{BatchProposer, ChunkProposer};
use rollup_relayer_watcher::{AlloyChainReader, L1Watcher, L2Watcher};
use std::{future::Future, sync::Arc};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run(NodeArgs::parse()).await {
        tracing::error!(target: "rollup::node", ?err, "fatal error");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber from `RUST_LOG`, at `info` otherwise.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Assembles the components and runs until interrupted.
async fn run(args: NodeArgs) -> eyre::Result<()> {
    let mut config = NodeConfig::from_file(&args.config)?;
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    if let Some(private_key) = args.private_key {
        config.private_key = Some(private_key);
    }
    if let Some(metrics_addr) = args.metrics_addr {
        config.metrics_addr = Some(metrics_addr);
    }

    if let Some(addr) = config.metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        tracing::info!(target: "rollup::node", %addr, "metrics exporter listening");
    }

    let db = Arc::new(Database::new(&config.database_url).await?);
    Migrator::up(db.get_connection(), None).await?;

    let codec_version = CodecVersion::try_from(config.codec_version)?;
    let Some(private_key) = config.private_key.clone() else {
        eyre::bail!("no submission private key configured");
    };
    let signer: PrivateKeySigner = private_key.parse()?;
    let wallet = EthereumWallet::from(signer);

    let l1_url = config.l1_rpc_url.parse()?;
    let l2_url = config.l2_rpc_url.parse()?;
    let l1_root: RootProvider = RootProvider::new_http(l1_url);
    let l2_root: RootProvider = RootProvider::new_http(l2_url);

    // the L2 relayer submits on L1, the gas price oracle submits on L2.
    let (l1_sender, l1_confirmations) = AlloySender::new(
        ProviderBuilder::new().wallet(wallet.clone()).connect_http(config.l2_rpc_url.parse()?),
    );
    let (l2_sender, l2_confirmations) = AlloySender::new(
        ProviderBuilder::new().wallet(wallet).connect_http(config.l1_rpc_url.parse()?),
    );

    let l1_watcher = Arc::new(L1Watcher::new(
        AlloyChainReader::new(l1_root),
        db.clone(),
        config.l1_watcher.clone(),
    ));
    let l2_watcher = Arc::new(L2Watcher::new(
        AlloyChainReader::new(l2_root.clone()),
        db.clone(),
        config.l2_watcher.clone(),
    ));
    let chunk_proposer =
        Arc::new(ChunkProposer::new(db.clone(), codec_version, config.chunk_proposer.clone()));
    let batch_proposer =
        Arc::new(BatchProposer::new(db.clone(), codec_version, config.batch_proposer.clone()));
    let l1_relayer =
        Arc::new(Layer1Relayer::new(db.clone(), l1_sender, config.l1_relayer.clone()));
    let l2_relayer = Arc::new(Layer2Relayer::new(
        db.clone(),
        AlloyChainReader::new(l2_root),
        l2_sender,
        config.l2_relayer.clone(),
    ));

    l2_relayer.import_genesis(&config.genesis.block()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut handles = Vec::new();

    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::L1_HEADER_FETCH_INTERVAL,
        "l1-headers",
        {
            let watcher = l1_watcher.clone();
            move || {
                let watcher = watcher.clone();
                async move { Ok(watcher.fetch_block_header().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::L1_EVENT_SCAN_INTERVAL,
        "l1-events",
        {
            let watcher = l1_watcher.clone();
            move || {
                let watcher = watcher.clone();
                async move { Ok(watcher.fetch_contract_events().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::L2_BLOCK_FETCH_INTERVAL,
        "l2-blocks",
        {
            let watcher = l2_watcher.clone();
            move || {
                let watcher = watcher.clone();
                async move { Ok(watcher.try_fetch_running_missing_blocks().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::CHUNK_PROPOSAL_INTERVAL,
        "chunk-proposer",
        {
            let proposer = chunk_proposer.clone();
            move || {
                let proposer = proposer.clone();
                async move { Ok(proposer.try_propose_chunk().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::BATCH_PROPOSAL_INTERVAL,
        "batch-proposer",
        {
            let proposer = batch_proposer.clone();
            move || {
                let proposer = proposer.clone();
                async move { Ok(proposer.try_propose_batch().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::L1_GAS_ORACLE_INTERVAL,
        "l1-gas-oracle",
        {
            let relayer = l1_relayer.clone();
            move || {
                let relayer = relayer.clone();
                async move { Ok(relayer.process_gas_price_oracle().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::L2_GAS_ORACLE_INTERVAL,
        "l2-gas-oracle",
        {
            let relayer = l2_relayer.clone();
            move || {
                let relayer = relayer.clone();
                async move { Ok(relayer.process_gas_price_oracle().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::PENDING_BATCH_INTERVAL,
        "pending-batches",
        {
            let relayer = l2_relayer.clone();
            move || {
                let relayer = relayer.clone();
                async move { Ok(relayer.process_pending_batches().await?) }
            }
        },
    ));
    handles.push(spawn_loop(
        shutdown_rx.clone(),
        constants::COMMITTED_BATCH_INTERVAL,
        "committed-batches",
        {
            let relayer = l2_relayer.clone();
            move || {
                let relayer = relayer.clone();
                async move { Ok(relayer.process_committed_batches().await?) }
            }
        },
    ));
    handles.push(spawn_confirmation_loop(
        shutdown_rx.clone(),
        l1_confirmations,
        "l1-confirmations",
        {
            let relayer = l1_relayer.clone();
            move |confirmation| {
                let relayer = relayer.clone();
                async move { Ok(relayer.handle_confirmation(confirmation).await?) }
            }
        },
    ));
    handles.push(spawn_confirmation_loop(
        shutdown_rx,
        l2_confirmations,
        "l2-confirmations",
        {
            let relayer = l2_relayer.clone();
            move |confirmation| {
                let relayer = relayer.clone();
                async move { Ok(relayer.handle_confirmation(confirmation).await?) }
            }
        },
    ));

    tracing::info!(target: "rollup::node", "rollup relayer started");
    tokio::signal::ctrl_c().await?;
    tracing::info!(target: "rollup::node", "shutting down");
    let _ = shutdown_tx.send(());
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

/// Spawns a loop running the task on every interval tick until shutdown.
fn spawn_loop<F, Fut>(
    mut shutdown: watch::Receiver<()>,
    period: std::time::Duration,
    name: &'static str,
    task: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = eyre::Result<()>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = interval.tick() => {
                    if let Err(err) = task().await {
                        tracing::error!(target: "rollup::node", loop_name = name, ?err, "loop iteration failed");
                    }
                }
            }
        }
    })
}

/// Spawns a loop draining a confirmation channel into its handler until
/// shutdown or channel closure.
fn spawn_confirmation_loop<F, Fut>(
    mut shutdown: watch::Receiver<()>,
    mut confirmations: mpsc::Receiver<Confirmation>,
    name: &'static str,
    handler: F,
) -> JoinHandle<()>
where
    F: Fn(Confirmation) -> Fut + Send + 'static,
    Fut: Future<Output = eyre::Result<()>> + Send,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                confirmation = confirmations.recv() => {
                    let Some(confirmation) = confirmation else { break };
                    if let Err(err) = handler(confirmation).await {
                        tracing::error!(target: "rollup::node", loop_name = name, ?err, "confirmation handling failed");
                    }
                }
            }
        }
    })
}
