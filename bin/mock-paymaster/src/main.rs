use std::sync::Arc;

use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use clap::Parser;
use mock_paymaster_core::logger::init_logger;
use mock_paymaster_rpc_lib::metrics::init_prometheus_exporter;
use mock_paymaster_rpc_lib::server::bind_rpc_server;
use mock_paymaster_rpc_lib::service::RpcService;
use mock_paymaster_rpc_lib::stub::StubPaymaster;
use mock_paymaster_rpc_lib::{Config, DEFAULT_CHAIN_ID};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::parse();

    init_logger(&config.log_level);

    if let Err(e) = init_prometheus_exporter(config.metrics_addr) {
        anyhow::bail!("Failed to install Prometheus exporter: {e}");
    }

    let chain_id = resolve_chain_id(&config).await?;

    info!(
        message = "Starting mock paymaster",
        address = %config.address,
        port = config.port,
        chain_id,
        metrics_address = %config.metrics_addr,
    );

    let service = Arc::new(RpcService::new(StubPaymaster::new(&config, chain_id)));
    let (addr, handle) = bind_rpc_server(config.rpc_addr(), service).await?;

    info!(
        message = "Mock paymaster RPC server started",
        address = %addr
    );

    handle.await?
}

/// The configured chain id wins, then the one reported by `anvil_rpc`.
async fn resolve_chain_id(config: &Config) -> anyhow::Result<u64> {
    if let Some(chain_id) = config.chain_id {
        return Ok(chain_id);
    }
    let Some(url) = config.anvil_rpc.clone() else {
        warn!(
            message = "No chain configured, using the local default",
            chain_id = DEFAULT_CHAIN_ID
        );
        return Ok(DEFAULT_CHAIN_ID);
    };

    let provider: RootProvider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(url);
    Ok(provider.get_chain_id().await?)
}
