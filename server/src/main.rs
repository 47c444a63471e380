// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Zilliqa Rosetta Server
//!
//! Entry point for the `zil-rosetta-server` binary. Parses CLI arguments,
//! initializes logging and metrics, wires the construction service to the
//! node and the mempool, and serves the HTTP API.
//!
//! Subcommands:
//!
//! - `run`: serve the Construction API
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use zil_construction::chain::HttpChainClient;
use zil_construction::config::NetworkConfig;
use zil_construction::mempool::{Mempool, MempoolConfig};
use zil_construction::transaction::TransactionCodec;
use zil_construction::ConstructionService;

use cli::{Commands, ZilRosettaCli};
use metrics::ServerMetrics;

/// How often expired transactions are swept from the mempool.
const MEMPOOL_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ZilRosettaCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server, the metrics endpoint and the mempool sweeper.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(args.log_format);

    let network = NetworkConfig::new(&args.network, args.chain_id).with_context(|| {
        format!(
            "unknown network {:?}: pass --chain-id for networks other than mainnet and testnet",
            args.network
        )
    })?;
    let rpc_timeout = Duration::from_millis(args.rpc_timeout_ms);

    tracing::info!(
        network = %network.network,
        chain_id = network.chain_id,
        port = args.port,
        metrics_port = args.metrics_port,
        offline = args.offline,
        broadcast = args.broadcast,
        "starting zil-rosetta-server"
    );

    // --- Mempool ---
    let mempool = Arc::new(Mempool::new(
        TransactionCodec::new(network.chain_id),
        MempoolConfig {
            max_size: args.mempool_max_size,
            max_per_sender: args.mempool_max_per_sender,
            expiry_seconds: args.mempool_expiry_seconds,
            min_gas_price: args.min_gas_price,
        },
    ));

    // --- Construction service ---
    let mut service = ConstructionService::new(network, mempool.clone())
        .with_broadcast(args.broadcast)
        .with_rpc_timeout(rpc_timeout);
    if args.offline {
        tracing::info!("offline mode: no node connection");
    } else {
        let client = HttpChainClient::new(&args.node_url, rpc_timeout)
            .with_context(|| format!("failed to create node client for {}", args.node_url))?;
        tracing::info!(node_url = %client.url(), "using Zilliqa node");
        service = service.with_chain_client(Arc::new(client));
    }

    // --- Metrics ---
    let server_metrics = Arc::new(ServerMetrics::new());

    // --- Application state ---
    let shutdown = CancellationToken::new();
    let app_state = api::AppState {
        service: Arc::new(service),
        mempool: Arc::clone(&mempool),
        metrics: Arc::clone(&server_metrics),
        shutdown: shutdown.clone(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("Construction API listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&server_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Mempool sweeper ---
    let sweep_pool = Arc::clone(&mempool);
    let sweep_metrics = Arc::clone(&server_metrics);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(MEMPOOL_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let expired = sweep_pool.expire_old();
            sweep_metrics
                .transactions_in_mempool
                .set(sweep_pool.size() as i64);
            if expired > 0 {
                tracing::debug!(expired, remaining = sweep_pool.size(), "swept mempool");
            }
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, cancelling in-flight node calls");
        }
    }

    shutdown.cancel();
    sweeper.abort();
    tracing::info!(pending = mempool.size(), "zil-rosetta-server stopped");
    Ok(())
}

fn print_version() {
    println!("zil-rosetta-server {}", env!("CARGO_PKG_VERSION"));
    println!("rustc              {}", rustc_version());
}

fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
