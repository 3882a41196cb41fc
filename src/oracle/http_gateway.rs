//! Oracle gateway for nodes running outside the server process.

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use reqwest::StatusCode as HttpStatus;
use serde::de::DeserializeOwned;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use super::gateway::{GatewayError, OracleGateway};
use crate::identity::Identity;
use crate::contract::{ContractEvent, EventStream, OracleIndexes, OracleResponse, SubmissionOutcome};
use crate::error::ContractError;
use crate::flight::{Address, Wei};
use crate::models::{
    ApiResponse, OracleRegistration, RegisterOracleRequest, RegistrationFee, SubmitResponseRequest,
};

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    identity: Identity,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, identity: Identity) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn events_url(&self) -> String {
        let url = self.url("/ws/events");
        if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            url
        }
    }
}

fn transport(error: impl std::fmt::Display) -> GatewayError {
    GatewayError::Transport(error.to_string())
}

/// Unwraps the API envelope, turning failures into `Refused`.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body: ApiResponse<T> = response.json().await.map_err(transport)?;

    match body {
        ApiResponse {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        ApiResponse { error, .. } => Err(GatewayError::Refused {
            status: status.as_u16(),
            reason: error.unwrap_or_else(|| status.to_string()),
        }),
    }
}

#[async_trait]
impl OracleGateway for HttpGateway {
    fn address(&self) -> &Address {
        self.identity.address()
    }

    async fn registration_fee(&self) -> Result<Wei, GatewayError> {
        let response = self
            .client
            .get(self.url("/api/oracles/fee"))
            .send()
            .await
            .map_err(transport)?;

        Ok(read_envelope::<RegistrationFee>(response).await?.fee)
    }

    async fn register(&self, fee: Wei) -> Result<OracleIndexes, GatewayError> {
        let request = RegisterOracleRequest {
            address: self.identity.address().to_string(),
            fee,
            signature: self.identity.sign_registration(fee),
        };
        let response = self
            .client
            .post(self.url("/api/oracles"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == HttpStatus::CONFLICT {
            return Err(ContractError::AlreadyRegistered.into());
        }
        Ok(read_envelope::<OracleRegistration>(response).await?.indexes)
    }

    async fn indexes(&self) -> Result<OracleIndexes, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("/api/oracles/{}/indexes", self.identity.address())))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == HttpStatus::NOT_FOUND {
            return Err(ContractError::NotRegistered.into());
        }
        Ok(read_envelope::<OracleRegistration>(response).await?.indexes)
    }

    async fn subscribe(&self) -> Result<EventStream, GatewayError> {
        let url = self.events_url();
        let (socket, _) = connect_async(url.as_str()).await.map_err(transport)?;
        debug!(url = %url, "event stream connected");

        let events = socket
            .take_while(|message| future::ready(message.is_ok()))
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ContractEvent>(&text) {
                        Ok(event) => Some(event),
                        Err(e) => {
                            warn!(error = %e, "skipping malformed event frame");
                            None
                        }
                    },
                    _ => None,
                }
            })
            .boxed();

        Ok(events)
    }

    async fn submit_response(&self, response: &OracleResponse) -> Result<SubmissionOutcome, GatewayError> {
        let request = SubmitResponseRequest::new(
            self.identity.address(),
            response,
            self.identity.sign_response(response),
        );
        let response = self
            .client
            .post(self.url("/api/oracles/responses"))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        read_envelope(response).await
    }
}
