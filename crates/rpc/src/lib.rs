pub mod handler;
pub mod metrics;
pub mod server;
pub mod service;
pub mod stub;
pub mod types;

use alloy_primitives::Address;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use url::Url;

/// Chain id of a local anvil/foundry node.
pub const DEFAULT_CHAIN_ID: u64 = 31337;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to bind the RPC server to
    #[arg(long, env = "MOCK_PAYMASTER_ADDRESS", default_value = "0.0.0.0")]
    pub address: IpAddr,

    /// Port to bind the RPC server to
    #[arg(long, env = "MOCK_PAYMASTER_PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "MOCK_PAYMASTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Port to bind the Prometheus metrics server to
    #[arg(
        long,
        env = "MOCK_PAYMASTER_METRICS_ADDR",
        default_value = "0.0.0.0:9000"
    )]
    pub metrics_addr: SocketAddr,

    /// URL of the local chain, used to read the chain id at startup
    #[arg(long, env = "ANVIL_RPC")]
    pub anvil_rpc: Option<Url>,

    /// Chain id to serve, skips the lookup against `anvil_rpc`
    #[arg(long, env = "MOCK_PAYMASTER_CHAIN_ID")]
    pub chain_id: Option<u64>,

    #[arg(
        long,
        env = "MOCK_PAYMASTER_ENTRY_POINT_V06",
        default_value = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789"
    )]
    pub entry_point_v06: Address,

    #[arg(
        long,
        env = "MOCK_PAYMASTER_ENTRY_POINT_V07",
        default_value = "0x0000000071727De22E5E9d8BAf0edAc6f37da032"
    )]
    pub entry_point_v07: Address,

    #[arg(
        long,
        env = "MOCK_PAYMASTER_ENTRY_POINT_V08",
        default_value = "0x4337084D9E255Ff0702461CF8895CE9E3b5Ff108"
    )]
    pub entry_point_v08: Address,

    /// Paymaster advertised for v0.6 user operations
    #[arg(
        long,
        env = "MOCK_PAYMASTER_PAYMASTER_V06",
        default_value = "0x0000000000000000000000000000000000ba0006"
    )]
    pub paymaster_v06: Address,

    /// Paymaster advertised for v0.7 user operations
    #[arg(
        long,
        env = "MOCK_PAYMASTER_PAYMASTER_V07",
        default_value = "0x0000000000000000000000000000000000ba0007"
    )]
    pub paymaster_v07: Address,

    /// Paymaster advertised for v0.8 user operations
    #[arg(
        long,
        env = "MOCK_PAYMASTER_PAYMASTER_V08",
        default_value = "0x0000000000000000000000000000000000ba0008"
    )]
    pub paymaster_v08: Address,

    #[arg(
        long,
        env = "MOCK_PAYMASTER_VERIFICATION_GAS_LIMIT",
        default_value = "50000"
    )]
    pub paymaster_verification_gas_limit: u64,

    #[arg(
        long,
        env = "MOCK_PAYMASTER_POST_OP_GAS_LIMIT",
        default_value = "20000"
    )]
    pub paymaster_post_op_gas_limit: u64,

    /// Used in place of a `callGasLimit` the caller did not estimate
    #[arg(long, env = "MOCK_PAYMASTER_CALL_GAS_LIMIT", default_value = "100000")]
    pub call_gas_limit: u64,

    /// Used in place of a `verificationGasLimit` the caller did not estimate
    #[arg(
        long,
        env = "MOCK_PAYMASTER_USER_VERIFICATION_GAS_LIMIT",
        default_value = "300000"
    )]
    pub verification_gas_limit: u64,

    /// Used in place of a `preVerificationGas` the caller did not estimate
    #[arg(
        long,
        env = "MOCK_PAYMASTER_PRE_VERIFICATION_GAS",
        default_value = "60000"
    )]
    pub pre_verification_gas: u64,

    /// Lifetime of paymaster data when the context does not set `validForSeconds`
    #[arg(
        long,
        env = "MOCK_PAYMASTER_VALID_FOR_SECONDS",
        default_value = "3600"
    )]
    pub valid_for_seconds: u64,

    /// Name returned as `sponsor.name` in stub data
    #[arg(
        long,
        env = "MOCK_PAYMASTER_SPONSOR_NAME",
        default_value = "Mock Paymaster"
    )]
    pub sponsor_name: String,
}

impl Config {
    /// Bind address of the JSON-RPC server.
    pub const fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}
