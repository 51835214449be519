//! The resource ledger: one non-negative counter per [`Resource`] plus the
//! permanently growing set of discovered resources.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, units};
use crate::id::Resource;

/// Errors from ledger debits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("not enough {resource:?}: need {required}, have {available}")]
    Insufficient {
        resource: Resource,
        required: Fixed64,
        available: Fixed64,
    },
}

/// Named counters. Amounts may be fractional (fuel is burned per second)
/// but never negative: every debit is preceded by an affordability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLedger {
    counters: BTreeMap<Resource, Fixed64>,
    discovered: BTreeSet<Resource>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Counters --

    /// Current amount of `resource` (0 if never credited).
    pub fn amount(&self, resource: Resource) -> Fixed64 {
        self.counters.get(&resource).copied().unwrap_or(Fixed64::ZERO)
    }

    /// Whether at least `amount` of `resource` is available.
    pub fn has(&self, resource: Resource, amount: Fixed64) -> bool {
        self.amount(resource) >= amount
    }

    /// Whether every `(resource, whole units)` pair is available.
    pub fn can_afford(&self, costs: &[(Resource, u32)]) -> bool {
        costs.iter().all(|&(r, n)| self.has(r, units(n)))
    }

    /// Add `amount` of `resource`. Non-positive amounts are ignored.
    pub fn credit(&mut self, resource: Resource, amount: Fixed64) {
        if amount <= Fixed64::ZERO {
            return;
        }
        let entry = self.counters.entry(resource).or_insert(Fixed64::ZERO);
        *entry = entry.saturating_add(amount);
    }

    /// Add whole units of `resource`.
    pub fn credit_units(&mut self, resource: Resource, n: u32) {
        self.credit(resource, units(n));
    }

    /// Remove `amount` of `resource`, or fail without touching the counter.
    pub fn try_debit(&mut self, resource: Resource, amount: Fixed64) -> Result<(), LedgerError> {
        let available = self.amount(resource);
        if available < amount {
            return Err(LedgerError::Insufficient {
                resource,
                required: amount,
                available,
            });
        }
        if amount > Fixed64::ZERO {
            self.counters.insert(resource, available - amount);
        }
        Ok(())
    }

    /// Debit every `(resource, whole units)` pair atomically: either all
    /// of them are removed or none is.
    pub fn try_debit_all(&mut self, costs: &[(Resource, u32)]) -> Result<(), LedgerError> {
        for &(resource, n) in costs {
            let required = units(n);
            let available = self.amount(resource);
            if available < required {
                return Err(LedgerError::Insufficient {
                    resource,
                    required,
                    available,
                });
            }
        }
        for &(resource, n) in costs {
            self.try_debit(resource, units(n))?;
        }
        Ok(())
    }

    /// Overwrite a counter. Negative values are clamped to zero.
    pub fn set(&mut self, resource: Resource, amount: Fixed64) {
        self.counters.insert(resource, amount.max(Fixed64::ZERO));
    }

    /// Every resource with its amount, in [`Resource::ALL`] order.
    pub fn snapshot(&self) -> Vec<(Resource, Fixed64)> {
        Resource::ALL
            .iter()
            .map(|&r| (r, self.amount(r)))
            .collect()
    }

    // -- Discovery --

    /// Mark `resource` as discovered. Returns true the first time only.
    pub fn discover(&mut self, resource: Resource) -> bool {
        self.discovered.insert(resource)
    }

    pub fn is_discovered(&self, resource: Resource) -> bool {
        self.discovered.contains(&resource)
    }

    /// Discovered resources in [`Resource`] order.
    pub fn discovered(&self) -> impl Iterator<Item = Resource> + '_ {
        self.discovered.iter().copied()
    }
}
