//! A single oracle: registers once, then answers requests for its indexes.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use super::gateway::{GatewayError, OracleGateway};
use super::status::StatusPolicy;
use crate::contract::{ContractEvent, EventStream, OracleIndexes, OracleResponse, SubmissionOutcome};
use crate::error::ContractError;
use crate::flight::{Address, FlightRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    Unregistered,
    Registering,
    Listening { indexes: OracleIndexes },
    Responding { index: u8 },
}

/// Counts from one `listen` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenSummary {
    pub submitted: usize,
    pub rejected: usize,
    pub failed: usize,
}

pub struct OracleClient {
    gateway: Arc<dyn OracleGateway>,
    policy: Box<dyn StatusPolicy>,
    state: ClientState,
    indexes: Option<OracleIndexes>,
}

impl OracleClient {
    pub fn new(gateway: Arc<dyn OracleGateway>, policy: Box<dyn StatusPolicy>) -> Self {
        Self {
            gateway,
            policy,
            state: ClientState::Unregistered,
            indexes: None,
        }
    }

    pub fn address(&self) -> &Address {
        self.gateway.address()
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn indexes(&self) -> Option<&OracleIndexes> {
        self.indexes.as_ref()
    }

    /// Pays the fee and registers. An oracle that is already registered
    /// (after a restart) reads its existing indexes instead.
    pub async fn register(&mut self) -> Result<OracleIndexes, GatewayError> {
        self.state = ClientState::Registering;

        let result = match self.gateway.registration_fee().await {
            Ok(fee) => match self.gateway.register(fee).await {
                Err(GatewayError::Rejected(ContractError::AlreadyRegistered)) => {
                    debug!(oracle = %self.address(), "already registered; reading indexes");
                    self.gateway.indexes().await
                }
                other => other,
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(indexes) => {
                info!(oracle = %self.address(), indexes = %indexes, "oracle ready");
                self.state = ClientState::Listening {
                    indexes: indexes.clone(),
                };
                self.indexes = Some(indexes.clone());
                Ok(indexes)
            }
            Err(e) => {
                self.state = ClientState::Unregistered;
                Err(e)
            }
        }
    }

    /// Registers if needed and opens the event stream.
    pub async fn connect(&mut self) -> Result<EventStream, GatewayError> {
        if self.indexes.is_none() {
            self.register().await?;
        }
        self.gateway.subscribe().await
    }

    /// Answers matching requests until the stream ends.
    pub async fn listen(&mut self, mut events: EventStream) -> ListenSummary {
        let mut summary = ListenSummary::default();

        while let Some(event) = events.next().await {
            match self.handle(&event).await {
                None => {}
                Some(Ok(outcome)) => {
                    summary.submitted += 1;
                    debug!(oracle = %self.address(), outcome = ?outcome, "response submitted");
                }
                Some(Err(GatewayError::Transport(e))) => {
                    summary.failed += 1;
                    warn!(oracle = %self.address(), error = %e, "response submission failed");
                }
                Some(Err(e)) => {
                    summary.rejected += 1;
                    debug!(oracle = %self.address(), error = %e, "response rejected");
                }
            }
        }

        summary
    }

    /// Submits one response if `event` is a request for one of our indexes.
    pub async fn handle(&mut self, event: &ContractEvent) -> Option<Result<SubmissionOutcome, GatewayError>> {
        let ContractEvent::OracleRequest {
            index,
            airline,
            flight,
            timestamp,
        } = event
        else {
            return None;
        };

        let indexes = self.indexes.clone()?;
        if !indexes.contains(*index) {
            return None;
        }

        self.state = ClientState::Responding { index: *index };
        let response = OracleResponse {
            index: *index,
            flight: FlightRef::new(airline.clone(), flight.clone(), *timestamp),
            status: self.policy.choose(),
        };
        let result = self.gateway.submit_response(&response).await;
        self.state = ClientState::Listening { indexes };

        Some(result)
    }
}
