//! # CLI Interface
//!
//! Command-line arguments for `zil-rosetta-server`, via `clap` derive.
//! Every `run` flag can also come from a `ZIL_ROSETTA_*` environment
//! variable.

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

/// Rosetta Construction API server for Zilliqa.
///
/// Builds, parses, hashes and submits Zilliqa payment transactions on
/// behalf of a client that holds the signing keys.
#[derive(Parser, Debug)]
#[command(
    name = "zil-rosetta-server",
    about = "Rosetta Construction API server for Zilliqa",
    version,
    propagate_version = true
)]
pub struct ZilRosettaCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the Construction API.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Network name clients must send in `network_identifier.network`.
    #[arg(long, env = "ZIL_ROSETTA_NETWORK", default_value = "mainnet")]
    pub network: String,

    /// Chain id override. Required for networks other than mainnet and
    /// testnet.
    #[arg(long, env = "ZIL_ROSETTA_CHAIN_ID")]
    pub chain_id: Option<u32>,

    /// Zilliqa JSON-RPC endpoint used for nonce, gas price and broadcast.
    #[arg(
        long,
        env = "ZIL_ROSETTA_NODE_URL",
        default_value = "https://api.zilliqa.com/"
    )]
    pub node_url: String,

    /// Deadline for each call to the node, in milliseconds.
    #[arg(long, env = "ZIL_ROSETTA_RPC_TIMEOUT_MS", default_value_t = 10_000)]
    pub rpc_timeout_ms: u64,

    /// Port for the Construction API.
    #[arg(long, env = "ZIL_ROSETTA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ZIL_ROSETTA_METRICS_PORT", default_value_t = 9090)]
    pub metrics_port: u16,

    /// Run without a node. `/construction/metadata` answers with the
    /// offline error; every other stage works.
    #[arg(long, env = "ZIL_ROSETTA_OFFLINE", conflicts_with = "broadcast")]
    pub offline: bool,

    /// Forward newly accepted transactions to the node on submit.
    #[arg(long, env = "ZIL_ROSETTA_BROADCAST")]
    pub broadcast: bool,

    /// Maximum number of transactions held in the mempool.
    #[arg(long, env = "ZIL_ROSETTA_MEMPOOL_MAX_SIZE", default_value_t = 10_000)]
    pub mempool_max_size: usize,

    /// Maximum pending transactions per sender.
    #[arg(long, env = "ZIL_ROSETTA_MEMPOOL_MAX_PER_SENDER", default_value_t = 100)]
    pub mempool_max_per_sender: usize,

    /// Seconds a transaction stays in the mempool before it expires.
    #[arg(long, env = "ZIL_ROSETTA_MEMPOOL_EXPIRY_SECONDS", default_value_t = 3600)]
    pub mempool_expiry_seconds: u64,

    /// Lowest gas price (Qa) the mempool accepts.
    #[arg(long, env = "ZIL_ROSETTA_MIN_GAS_PRICE", default_value_t = 0)]
    pub min_gas_price: u128,

    #[arg(long, value_enum, env = "ZIL_ROSETTA_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        ZilRosettaCli::command().debug_assert();
    }

    #[test]
    fn offline_conflicts_with_broadcast() {
        let result =
            ZilRosettaCli::try_parse_from(["zil-rosetta-server", "run", "--offline", "--broadcast"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_defaults() {
        let cli = ZilRosettaCli::try_parse_from([
            "zil-rosetta-server",
            "run",
            "--network",
            "testnet",
            "--log-format",
            "json",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.network, "testnet");
        assert_eq!(args.chain_id, None);
        assert_eq!(args.rpc_timeout_ms, 10_000);
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(!args.offline);
    }
}
