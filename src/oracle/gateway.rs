//! The seam between an oracle client and the contract it talks to.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::contract::{EventStream, FlightSuretyContract, OracleIndexes, OracleResponse, SubmissionOutcome};
use crate::error::ContractError;
use crate::flight::{Address, Wei};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The contract processed the call and refused it.
    #[error(transparent)]
    Rejected(#[from] ContractError),

    /// A remote server refused the call before it reached the contract.
    #[error("Server refused the call ({status}): {reason}")]
    Refused { status: u16, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Whether retrying the same call could succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

#[async_trait]
pub trait OracleGateway: Send + Sync {
    /// The identity this gateway acts as.
    fn address(&self) -> &Address;

    async fn registration_fee(&self) -> Result<Wei, GatewayError>;

    async fn register(&self, fee: Wei) -> Result<OracleIndexes, GatewayError>;

    async fn indexes(&self) -> Result<OracleIndexes, GatewayError>;

    /// Live contract events from this call on.
    async fn subscribe(&self) -> Result<EventStream, GatewayError>;

    async fn submit_response(&self, response: &OracleResponse) -> Result<SubmissionOutcome, GatewayError>;
}

/// Calls an in-process contract directly.
#[derive(Clone)]
pub struct LocalGateway {
    contract: Arc<FlightSuretyContract>,
    address: Address,
}

impl LocalGateway {
    pub fn new(contract: Arc<FlightSuretyContract>, address: Address) -> Self {
        Self { contract, address }
    }
}

#[async_trait]
impl OracleGateway for LocalGateway {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn registration_fee(&self) -> Result<Wei, GatewayError> {
        Ok(self.contract.registration_fee())
    }

    async fn register(&self, fee: Wei) -> Result<OracleIndexes, GatewayError> {
        Ok(self.contract.register_oracle(&self.address, fee).await?)
    }

    async fn indexes(&self) -> Result<OracleIndexes, GatewayError> {
        Ok(self.contract.oracle_indexes(&self.address).await?)
    }

    async fn subscribe(&self) -> Result<EventStream, GatewayError> {
        Ok(self.contract.events().stream())
    }

    async fn submit_response(&self, response: &OracleResponse) -> Result<SubmissionOutcome, GatewayError> {
        Ok(self.contract.submit_oracle_response(&self.address, response).await?)
    }
}
