//! Flight registration, insurance policies and passenger balances.
//!
//! This is the consumer of the status ledger: a policy pays out only when
//! the finalized status of its flight is `LateAirline`.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ContractError;
use crate::flight::{Address, FlightKey, FlightRef, StatusCode, Wei, ONE_ETHER};

pub const MAX_PREMIUM: Wei = ONE_ETHER;

/// Payout as a percentage of the premium.
pub const PAYOUT_RATE_PERCENT: Wei = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub premium: Wei,
    pub rate: Wei,
    pub paid: bool,
}

impl Policy {
    pub fn payout(&self) -> Wei {
        self.premium.saturating_mul(self.rate) / 100
    }
}

#[derive(Default)]
pub struct InsuranceBook {
    flights: HashMap<FlightKey, FlightRef>,
    policies: HashMap<(Address, FlightKey), Policy>,
    balances: HashMap<Address, Wei>,
}

impl InsuranceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_flight(&mut self, flight: &FlightRef) -> Result<FlightKey, ContractError> {
        let key = flight.key();
        if self.flights.contains_key(&key) {
            return Err(ContractError::FlightAlreadyRegistered);
        }
        self.flights.insert(key, flight.clone());
        Ok(key)
    }

    pub fn is_flight_registered(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&FlightRef> {
        self.flights.get(key)
    }

    pub fn buy(&mut self, passenger: &Address, key: &FlightKey, premium: Wei) -> Result<&Policy, ContractError> {
        if premium == 0 {
            return Err(ContractError::NoPremium);
        }
        if premium > MAX_PREMIUM {
            return Err(ContractError::PremiumTooHigh { max: MAX_PREMIUM });
        }
        if !self.flights.contains_key(key) {
            return Err(ContractError::FlightNotRegistered);
        }

        let policy_key = (passenger.clone(), *key);
        if self.policies.contains_key(&policy_key) {
            return Err(ContractError::AlreadyInsured);
        }

        Ok(self.policies.entry(policy_key).or_insert(Policy {
            premium,
            rate: PAYOUT_RATE_PERCENT,
            paid: false,
        }))
    }

    pub fn policy(&self, passenger: &Address, key: &FlightKey) -> Option<&Policy> {
        self.policies.get(&(passenger.clone(), *key))
    }

    /// Credits the passenger's balance if the flight was late through airline fault.
    pub fn claim(&mut self, passenger: &Address, key: &FlightKey, status: StatusCode) -> Result<Wei, ContractError> {
        if !status.is_claimable() {
            return Err(ContractError::NotClaimable);
        }

        let policy = self
            .policies
            .get_mut(&(passenger.clone(), *key))
            .ok_or(ContractError::NotInsured)?;
        if policy.paid {
            return Err(ContractError::AlreadyClaimed);
        }

        policy.paid = true;
        let credit = policy.payout();
        let balance = self.balances.entry(passenger.clone()).or_insert(0);
        *balance = balance.saturating_add(credit);

        Ok(credit)
    }

    pub fn balance_of(&self, passenger: &Address) -> Wei {
        self.balances.get(passenger).copied().unwrap_or(0)
    }

    pub fn withdraw(&mut self, passenger: &Address) -> Result<Wei, ContractError> {
        match self.balances.remove(passenger) {
            Some(amount) if amount > 0 => Ok(amount),
            _ => Err(ContractError::NothingToWithdraw),
        }
    }
}
