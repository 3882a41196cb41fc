//! Off-chain oracle side: status simulation, gateways to the contract, the
//! per-oracle client and the supervised pool.

pub mod client;
pub mod gateway;
pub mod http_gateway;
pub mod pool;
pub mod status;

pub use client::{ClientState, ListenSummary, OracleClient};
pub use gateway::{GatewayError, LocalGateway, OracleGateway};
pub use http_gateway::HttpGateway;
pub use pool::{OraclePool, PolicyFactory};
pub use status::{FixedStatusPolicy, NormalStatusPolicy, StatusPolicy};
