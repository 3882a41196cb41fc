//! Error types for the contract core, configuration and the HTTP API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::flight::Wei;
use crate::models::ApiResponse;
use crate::identity::SignatureError;

/// Rejections raised by the contract core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Contract is paused")]
    Paused,

    #[error("Caller does not have the pauser role")]
    Unauthorized,

    #[error("Account already has the pauser role")]
    AlreadyPauser,

    #[error("Registration fee is required: {required} wei, paid {paid} wei")]
    InsufficientFee { required: Wei, paid: Wei },

    #[error("Oracle is already registered")]
    AlreadyRegistered,

    #[error("Oracle is not registered")]
    NotRegistered,

    #[error("Index {index} does not match oracle request")]
    IndexMismatch { index: u8 },

    #[error("Flight or timestamp do not match oracle request")]
    RequestNotFound,

    #[error("Flight status is already resolved")]
    AlreadyResolved,

    #[error("Unknown is not a reportable flight status")]
    UnknownStatus,

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u8),

    #[error("Flight is already registered")]
    FlightAlreadyRegistered,

    #[error("Flight is not registered")]
    FlightNotRegistered,

    #[error("Passenger need to send some ether to purchase flight insurance")]
    NoPremium,

    #[error("Maximum insurance purchase amount is {max} wei")]
    PremiumTooHigh { max: Wei },

    #[error("Passenger already insured this flight")]
    AlreadyInsured,

    #[error("Passenger did not insure this flight")]
    NotInsured,

    #[error("Flight is not delayed due to airline fault")]
    NotClaimable,

    #[error("Insurance has already been claimed")]
    AlreadyClaimed,

    #[error("No balance to withdraw")]
    NothingToWithdraw,
}

impl ContractError {
    /// Caller lacks the role or fee required for the call.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            ContractError::Unauthorized
                | ContractError::InsufficientFee { .. }
                | ContractError::NotRegistered
                | ContractError::IndexMismatch { .. }
        )
    }
}

/// Invalid environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Parse {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not get a flight status update from oracles for request index {request_index}. Please try again.")]
    ConsensusTimeout { request_index: u8 },
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl From<SignatureError> for ApiError {
    fn from(error: SignatureError) -> Self {
        ApiError::Unauthorized(error.to_string())
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Contract(error) => match error {
                ContractError::InsufficientFee { .. } => StatusCode::PAYMENT_REQUIRED,
                ContractError::Unauthorized | ContractError::IndexMismatch { .. } => {
                    StatusCode::FORBIDDEN
                }
                ContractError::NotRegistered
                | ContractError::RequestNotFound
                | ContractError::FlightNotRegistered
                | ContractError::NotInsured => StatusCode::NOT_FOUND,
                ContractError::Paused => StatusCode::SERVICE_UNAVAILABLE,
                ContractError::UnknownStatus
                | ContractError::InvalidStatusCode(_)
                | ContractError::NoPremium
                | ContractError::PremiumTooHigh { .. } => StatusCode::BAD_REQUEST,
                ContractError::AlreadyRegistered
                | ContractError::AlreadyResolved
                | ContractError::AlreadyPauser
                | ContractError::FlightAlreadyRegistered
                | ContractError::AlreadyInsured
                | ContractError::NotClaimable
                | ContractError::AlreadyClaimed
                | ContractError::NothingToWithdraw => StatusCode::CONFLICT,
            },
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ConsensusTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body: ApiResponse<()> = ApiResponse::failure(self.to_string());

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
