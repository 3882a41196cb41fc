//! Registry of fee-paying oracles and their assigned indexes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::indexes::{IndexAssigner, OracleIndexes};
use crate::error::ContractError;
use crate::flight::{Address, Wei};

/// A registered oracle. Never removed once registered.
#[derive(Debug, Clone, Serialize)]
pub struct Oracle {
    pub address: Address,
    pub indexes: OracleIndexes,
    pub registered_at: DateTime<Utc>,
}

pub struct OracleRegistry {
    fee: Wei,
    indexes_per_oracle: usize,
    oracles: HashMap<Address, Oracle>,
    collected_fees: Wei,
}

impl OracleRegistry {
    pub fn new(fee: Wei, indexes_per_oracle: usize) -> Self {
        Self {
            fee,
            indexes_per_oracle,
            oracles: HashMap::new(),
            collected_fees: 0,
        }
    }

    pub fn fee(&self) -> Wei {
        self.fee
    }

    /// Registers `address`, drawing its indexes from `assigner`.
    pub fn register(
        &mut self,
        address: &Address,
        paid: Wei,
        assigner: &mut IndexAssigner,
    ) -> Result<&Oracle, ContractError> {
        if paid < self.fee {
            return Err(ContractError::InsufficientFee {
                required: self.fee,
                paid,
            });
        }

        if self.oracles.contains_key(address) {
            return Err(ContractError::AlreadyRegistered);
        }

        let oracle = Oracle {
            address: address.clone(),
            indexes: assigner.assign(address, self.indexes_per_oracle),
            registered_at: Utc::now(),
        };
        self.collected_fees = self.collected_fees.saturating_add(paid);

        Ok(self.oracles.entry(address.clone()).or_insert(oracle))
    }

    pub fn is_registered(&self, address: &Address) -> bool {
        self.oracles.contains_key(address)
    }

    pub fn indexes_of(&self, address: &Address) -> Result<&OracleIndexes, ContractError> {
        self.oracles
            .get(address)
            .map(|oracle| &oracle.indexes)
            .ok_or(ContractError::NotRegistered)
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn collected_fees(&self) -> Wei {
        self.collected_fees
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flight::ONE_ETHER;

    fn setup() -> (OracleRegistry, IndexAssigner) {
        (
            OracleRegistry::new(ONE_ETHER, 3),
            IndexAssigner::from_seed([9; 32], 10),
        )
    }

    #[test]
    fn test_register_oracle() {
        let (mut registry, mut assigner) = setup();
        let oracle = Address::new("oracle1");

        let registered = registry.register(&oracle, ONE_ETHER, &mut assigner).unwrap();
        assert_eq!(registered.indexes.len(), 3);
        let indexes = registered.indexes.clone();

        assert!(registry.is_registered(&oracle));
        assert_eq!(registry.indexes_of(&oracle).unwrap(), &indexes);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.collected_fees(), ONE_ETHER);
    }

    #[test]
    fn test_insufficient_fee_is_rejected() {
        let (mut registry, mut assigner) = setup();
        let oracle = Address::new("oracle1");

        let result = registry.register(&oracle, ONE_ETHER - 1, &mut assigner);
        assert_eq!(
            result.err(),
            Some(ContractError::InsufficientFee {
                required: ONE_ETHER,
                paid: ONE_ETHER - 1
            })
        );
        assert!(!registry.is_registered(&oracle));
        assert_eq!(registry.collected_fees(), 0);
    }

    #[test]
    fn test_double_registration_fails() {
        let (mut registry, mut assigner) = setup();
        let oracle = Address::new("oracle1");

        let first = registry.register(&oracle, ONE_ETHER, &mut assigner).unwrap().indexes.clone();
        assert_eq!(
            registry.register(&oracle, ONE_ETHER, &mut assigner).err(),
            Some(ContractError::AlreadyRegistered)
        );

        // The first indexes survive the failed attempt
        assert_eq!(registry.indexes_of(&oracle).unwrap(), &first);
        assert_eq!(registry.collected_fees(), ONE_ETHER);
    }

    #[test]
    fn test_unregistered_indexes_lookup() {
        let (registry, _) = setup();
        assert_eq!(
            registry.indexes_of(&Address::new("stranger")).err(),
            Some(ContractError::NotRegistered)
        );
    }
}
