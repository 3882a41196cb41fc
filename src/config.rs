//! Server configuration read from the environment.

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::time::Duration;

use crate::contract::ContractParams;
use crate::error::ConfigError;
use crate::flight::{Address, Wei, ONE_ETHER};
use crate::identity::verifying_key;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub cors_allowed_origins: Vec<String>,
    pub contract: ContractParams,
    /// In-process oracles launched by the server.
    pub oracle_count: usize,
    pub airline_count: usize,
    pub flight_count: usize,
    pub status_fetch_timeout: Duration,
    pub event_bus_capacity: usize,
    /// Hex ed25519 public key of the owner, the first pauser.
    pub contract_owner: Option<Address>,
    /// How far `issued_at` of a signed request may be from now.
    pub signature_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            cors_allowed_origins: vec!["http://localhost:4200".to_string()],
            contract: ContractParams::default(),
            oracle_count: 20,
            airline_count: 5,
            flight_count: 100,
            status_fetch_timeout: Duration::from_millis(5000),
            event_bus_capacity: 1024,
            contract_owner: None,
            signature_window: Duration::from_secs(300),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &'static str| lookup(key).filter(|value| !value.trim().is_empty());

        let index_range: u16 = parse_or(get("ORACLE_INDEX_RANGE"), "ORACLE_INDEX_RANGE", 10)?;
        let index_range = u8::try_from(index_range).map_err(|_| {
            ConfigError::Invalid(format!("ORACLE_INDEX_RANGE must be at most 255, got {}", index_range))
        })?;

        let config = Self {
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            bind_addr: parse_or(get("BIND_ADDR"), "BIND_ADDR", defaults.bind_addr)?,
            cors_allowed_origins: match get("CORS_ALLOWED_ORIGINS") {
                Some(origins) => origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect(),
                None => defaults.cors_allowed_origins,
            },
            contract: ContractParams {
                registration_fee: parse_or::<Wei>(get("REGISTRATION_FEE_WEI"), "REGISTRATION_FEE_WEI", ONE_ETHER)?,
                quorum: parse_or(get("ORACLE_QUORUM"), "ORACLE_QUORUM", defaults.contract.quorum)?,
                index_range,
                indexes_per_oracle: parse_or(
                    get("ORACLE_INDEXES_PER_ORACLE"),
                    "ORACLE_INDEXES_PER_ORACLE",
                    defaults.contract.indexes_per_oracle,
                )?,
            },
            oracle_count: parse_or(get("ORACLE_COUNT"), "ORACLE_COUNT", defaults.oracle_count)?,
            airline_count: parse_or(get("AIRLINE_COUNT"), "AIRLINE_COUNT", defaults.airline_count)?,
            flight_count: parse_or(get("FLIGHT_COUNT"), "FLIGHT_COUNT", defaults.flight_count)?,
            status_fetch_timeout: Duration::from_millis(parse_or(
                get("STATUS_FETCH_TIMEOUT_MS"),
                "STATUS_FETCH_TIMEOUT_MS",
                5000u64,
            )?),
            event_bus_capacity: parse_or(get("EVENT_BUS_CAPACITY"), "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?,
            contract_owner: get("CONTRACT_OWNER").map(|owner| Address::new(owner.trim().to_lowercase())),
            signature_window: Duration::from_secs(parse_or(
                get("SIGNED_REQUEST_WINDOW_SECS"),
                "SIGNED_REQUEST_WINDOW_SECS",
                defaults.signature_window.as_secs(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.contract.validate()?;
        if self.event_bus_capacity == 0 {
            return Err(ConfigError::Invalid("EVENT_BUS_CAPACITY must be at least 1".to_string()));
        }
        if let Some(owner) = &self.contract_owner {
            verifying_key(owner).map_err(|e| {
                ConfigError::Invalid(format!("CONTRACT_OWNER must be a hex ed25519 public key: {}", e))
            })?;
        }
        if self.signature_window.is_zero() {
            return Err(ConfigError::Invalid("SIGNED_REQUEST_WINDOW_SECS must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Parse {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
