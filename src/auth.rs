//! Signed requests from passengers and pausers.
//!
//! Every call carries the caller's address, a unix `issued_at` and a
//! signature over `{action}:{caller}:{issued_at}` followed by the call's
//! fields, each prefixed with `:`. Fields are hex or decimal, never free
//! text, so two different calls never share a message. A message is
//! accepted once, and only while `issued_at` is inside the freshness window.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::debug;
use validator::Validate;

use crate::error::ApiError;
use crate::flight::Address;
use crate::identity::{verify_signature, Identity};

/// Operations that need a signed caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Unpause,
    AddPauser,
    RenouncePauser,
    BuyInsurance,
    Claim,
    Withdraw,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Pause => "pause",
            Action::Unpause => "unpause",
            Action::AddPauser => "add_pauser",
            Action::RenouncePauser => "renounce_pauser",
            Action::BuyInsurance => "buy_insurance",
            Action::Claim => "claim",
            Action::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical message for `action`.
pub fn action_message(action: Action, caller: &Address, issued_at: i64, fields: &[&str]) -> String {
    let mut message = format!("{}:{}:{}", action, caller, issued_at);
    for field in fields {
        message.push(':');
        message.push_str(field);
    }
    message
}

/// Caller credentials attached to a request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignedAction {
    #[validate(length(equal = 64))]
    pub caller: String,
    #[serde(default)]
    pub issued_at: i64,
    #[serde(default)]
    #[validate(length(equal = 128))]
    pub signature: String,
}

impl SignedAction {
    pub fn sign(identity: &Identity, action: Action, fields: &[&str]) -> Self {
        Self::sign_at(identity, action, Utc::now().timestamp(), fields)
    }

    pub fn sign_at(identity: &Identity, action: Action, issued_at: i64, fields: &[&str]) -> Self {
        Self {
            caller: identity.address().to_string(),
            issued_at,
            signature: identity.sign(&action_message(action, identity.address(), issued_at, fields)),
        }
    }

    pub fn caller(&self) -> Address {
        Address::new(self.caller.to_lowercase())
    }
}

/// Checks signed requests and remembers the ones it accepted.
pub struct RequestAuthenticator {
    window: Duration,
    accepted: Mutex<HashMap<String, i64>>,
}

impl RequestAuthenticator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the verified caller of `action`.
    pub async fn authenticate(
        &self,
        action: Action,
        signed: &SignedAction,
        fields: &[&str],
    ) -> Result<Address, ApiError> {
        if signed.signature.is_empty() {
            return Err(ApiError::Unauthorized("Request is not signed".to_string()));
        }
        signed.validate()?;
        let caller = signed.caller();
        let now = Utc::now().timestamp();
        let window = i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX);

        if now.abs_diff(signed.issued_at) > window.unsigned_abs() {
            return Err(ApiError::Unauthorized(
                "Signed request is outside the freshness window".to_string(),
            ));
        }

        let message = action_message(action, &caller, signed.issued_at, fields);
        verify_signature(&caller, &message, &signed.signature)?;

        let mut accepted = self.accepted.lock().await;
        accepted.retain(|_, issued_at| now.saturating_sub(*issued_at) <= window);
        if accepted.insert(message, signed.issued_at).is_some() {
            return Err(ApiError::Unauthorized("Signed request was already used".to_string()));
        }
        debug!(caller = %caller, action = %action, "signed request accepted");

        Ok(caller)
    }

    /// For routes whose whole body is a [`SignedAction`]; a missing or
    /// unreadable body is an unsigned request.
    pub async fn authenticate_body(
        &self,
        action: Action,
        body: Option<&SignedAction>,
    ) -> Result<Address, ApiError> {
        match body {
            Some(signed) => self.authenticate(action, signed, &[]).await,
            None => Err(ApiError::Unauthorized("Request is not signed".to_string())),
        }
    }
}
