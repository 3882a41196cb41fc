//! ed25519 keypairs and signed messages.
//!
//! An account's address is its hex-encoded ed25519 verifying key, so the
//! server can check a signature without any prior key exchange. Remote
//! oracles, passengers and pausers all sign this way.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::contract::OracleResponse;
use crate::flight::{Address, Wei};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid address hex: {0}")]
    AddressHex(String),

    #[error("Invalid public key length")]
    KeyLength,

    #[error("Invalid public key bytes: {0}")]
    Key(String),

    #[error("Invalid signature hex: {0}")]
    SignatureHex(String),

    #[error("Invalid signature length")]
    SignatureLength,

    #[error("Signature verification failed")]
    Mismatch,

    #[error("Secret key must be a 64-char hex string (Ed25519 seed)")]
    SecretKey,
}

/// Canonical message an oracle signs to register.
pub fn registration_message(address: &Address, fee: Wei) -> String {
    format!("register:{}:{}", address, fee)
}

/// Canonical message an oracle signs to submit a response.
///
/// The flight is named by its key rather than its raw fields, so a
/// signature covers exactly one `(airline, flight, timestamp)` triple.
pub fn response_message(response: &OracleResponse) -> String {
    format!(
        "respond:{}:{}:{}",
        response.index,
        response.flight.key(),
        response.status.code()
    )
}

/// Parses an address back into its verifying key.
pub fn verifying_key(address: &Address) -> Result<VerifyingKey, SignatureError> {
    let key_bytes = hex::decode(address.as_str()).map_err(|e| SignatureError::AddressHex(e.to_string()))?;
    let key_bytes: [u8; 32] = key_bytes.try_into().map_err(|_| SignatureError::KeyLength)?;
    VerifyingKey::from_bytes(&key_bytes).map_err(|e| SignatureError::Key(e.to_string()))
}

/// Checks that `signature_hex` is `address`'s signature over `message`.
pub fn verify_signature(address: &Address, message: &str, signature_hex: &str) -> Result<(), SignatureError> {
    let public_key = verifying_key(address)?;

    let sig_bytes = hex::decode(signature_hex).map_err(|e| SignatureError::SignatureHex(e.to_string()))?;
    let sig_bytes: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| SignatureError::SignatureLength)?;
    let signature = Signature::from_bytes(&sig_bytes);

    public_key
        .verify(message.as_bytes(), &signature)
        .map_err(|_| SignatureError::Mismatch)
}

/// Signing identity of an oracle node, passenger or pauser.
#[derive(Clone)]
pub struct Identity {
    key: SigningKey,
    address: Address,
}

impl Identity {
    pub fn generate() -> Self {
        Self::from_key(SigningKey::generate(&mut OsRng))
    }

    /// Accepts a 64-char hex seed, as found in `ORACLE_SECRET_KEY`.
    pub fn from_secret_hex(secret: &str) -> Result<Self, SignatureError> {
        let seed = hex::decode(secret.trim()).map_err(|_| SignatureError::SecretKey)?;
        let seed: [u8; 32] = seed.try_into().map_err(|_| SignatureError::SecretKey)?;
        Ok(Self::from_key(SigningKey::from_bytes(&seed)))
    }

    fn from_key(key: SigningKey) -> Self {
        let address = Address::new(hex::encode(key.verifying_key().to_bytes()));
        Self { key, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.key.to_bytes())
    }

    pub fn sign(&self, message: &str) -> String {
        hex::encode(self.key.sign(message.as_bytes()).to_bytes())
    }

    pub fn sign_registration(&self, fee: Wei) -> String {
        self.sign(&registration_message(&self.address, fee))
    }

    pub fn sign_response(&self, response: &OracleResponse) -> String {
        self.sign(&response_message(response))
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
