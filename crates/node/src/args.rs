use std::{net::SocketAddr, path::PathBuf};

/// The command line arguments of the rollup relayer.
#[derive(Debug, clap::Parser)]
#[command(name = "rollup-relayer", about = "Relays L2 blocks into batches on L1")]
pub(crate) struct NodeArgs {
    /// The path to the JSON configuration file.
    #[arg(long, env = "RELAYER_CONFIG")]
    pub(crate) config: PathBuf,
    /// Overrides the database connection string of the configuration file.
    #[arg(long, env = "DATABASE_URL")]
    pub(crate) database_url: Option<String>,
    /// Overrides the submission private key of the configuration file.
    #[arg(long, env = "RELAYER_PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: Option<String>,
    /// Overrides the Prometheus listener address of the configuration file.
    #[arg(long)]
    pub(crate) metrics_addr: Option<SocketAddr>,
}
