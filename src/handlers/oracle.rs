//! Remote oracle registration and signed responses.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};
use validator::Validate;

use crate::contract::{FlightSuretyContract, SubmissionOutcome};
use crate::error::{ApiError, ApiResult};
use crate::flight::Address;
use crate::models::{ApiResponse, OracleRegistration, RegisterOracleRequest, RegistrationFee, SubmitResponseRequest};
use crate::identity::{registration_message, response_message, verify_signature};

pub async fn registration_fee(State(contract): State<Arc<FlightSuretyContract>>) -> ApiResult<RegistrationFee> {
    Ok(Json(ApiResponse::success(RegistrationFee {
        fee: contract.registration_fee(),
    })))
}

/// Registers a remote oracle whose address is its ed25519 public key.
pub async fn register_oracle(
    State(contract): State<Arc<FlightSuretyContract>>,
    Json(request): Json<RegisterOracleRequest>,
) -> ApiResult<OracleRegistration> {
    request.validate()?;
    let address = Address::new(request.address.to_lowercase());

    verify_signature(
        &address,
        &registration_message(&address, request.fee),
        &request.signature,
    )?;

    let indexes = contract.register_oracle(&address, request.fee).await?;
    info!(oracle = %address, "remote oracle registered");

    Ok(Json(ApiResponse::success(OracleRegistration { address, indexes })))
}

pub async fn oracle_indexes(
    State(contract): State<Arc<FlightSuretyContract>>,
    Path(address): Path<String>,
) -> ApiResult<OracleRegistration> {
    let address = Address::new(address);
    let indexes = contract
        .oracle_indexes(&address)
        .await
        .map_err(|_| ApiError::NotFound(format!("Oracle {} is not registered", address)))?;

    Ok(Json(ApiResponse::success(OracleRegistration { address, indexes })))
}

pub async fn submit_response(
    State(contract): State<Arc<FlightSuretyContract>>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<SubmissionOutcome> {
    request.validate()?;
    let address = Address::new(request.address.to_lowercase());
    let response = request.response()?;

    verify_signature(&address, &response_message(&response), &request.signature)?;

    let outcome = contract.submit_oracle_response(&address, &response).await?;
    debug!(oracle = %address, index = response.index, outcome = ?outcome, "remote oracle response");

    Ok(Json(ApiResponse::success(outcome)))
}
