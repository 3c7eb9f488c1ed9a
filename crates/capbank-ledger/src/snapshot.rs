//! Serializable point-in-time copies of a bank

use std::collections::BTreeMap;

use capbank_types::{AccountId, Amount, EventRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::bank::{Bank, LedgerState};

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur when restoring a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Books do not reconcile: held {held}, owed {liabilities}, endowment {endowment}")]
    Unbalanced {
        held: Amount,
        liabilities: Amount,
        endowment: Amount,
    },

    #[error("Account balances sum past the largest representable amount")]
    LiabilitiesOverflow,

    #[error("Event sequence {sequence} is beyond the recorded last sequence {last_sequence}")]
    SequenceAhead { sequence: u64, last_sequence: u64 },
}

/// Complete serializable state of a bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSnapshot {
    pub version: u32,
    pub bank_cap: Amount,
    pub endowment: Amount,
    pub held: Amount,
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub balances: BTreeMap<AccountId, Amount>,
    pub events: Vec<EventRecord>,
    pub last_sequence: u64,
    pub taken_at: DateTime<Utc>,
}

impl Bank {
    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot {
            version: SNAPSHOT_VERSION,
            bank_cap: self.bank_cap(),
            endowment: self.endowment(),
            held: self.state.held,
            total_deposits: self.state.total_deposits,
            total_withdrawals: self.state.total_withdrawals,
            balances: self.accounts().into_iter().collect(),
            events: self.state.journal.clone(),
            last_sequence: self.state.last_sequence,
            taken_at: Utc::now(),
        }
    }

    /// Rebuild a bank from a snapshot, refusing books that do not reconcile
    pub fn from_snapshot(snapshot: BankSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if let Some(record) = snapshot
            .events
            .iter()
            .find(|r| r.sequence > snapshot.last_sequence)
        {
            return Err(SnapshotError::SequenceAhead {
                sequence: record.sequence,
                last_sequence: snapshot.last_sequence,
            });
        }

        let state = LedgerState {
            balances: snapshot.balances.into_iter().collect(),
            held: snapshot.held,
            total_deposits: snapshot.total_deposits,
            total_withdrawals: snapshot.total_withdrawals,
            journal: snapshot.events,
            last_sequence: snapshot.last_sequence,
        };
        let bank = Bank::from_parts(snapshot.bank_cap, snapshot.endowment, state);

        let books = bank.reconcile();
        let Some(liabilities) = books.liabilities else {
            return Err(SnapshotError::LiabilitiesOverflow);
        };
        if !books.is_balanced() {
            return Err(SnapshotError::Unbalanced {
                held: books.held,
                liabilities,
                endowment: books.endowment,
            });
        }

        info!(
            cap = %bank.bank_cap(),
            held = %bank.held_value(),
            accounts = bank.accounts().len(),
            "bank restored from snapshot"
        );
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipient::Wallets;

    fn populated() -> Bank {
        let mut bank = Bank::with_endowment(Amount::units(500), Amount::units(5));
        let mut wallets = Wallets::new();
        bank.deposit(&AccountId::from("alice"), Amount::units(60)).unwrap();
        bank.deposit(&AccountId::from("bob"), Amount::units(7)).unwrap();
        bank.withdraw(&AccountId::from("alice"), Amount::units(50), &mut wallets)
            .unwrap();
        bank
    }

    #[test]
    fn test_snapshot_restores_equivalent_bank() {
        let bank = populated();
        let json = serde_json::to_string(&bank.snapshot()).unwrap();

        let restored = Bank::from_snapshot(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.bank_cap(), Amount::units(500));
        assert_eq!(restored.endowment(), Amount::units(5));
        assert_eq!(restored.held_value(), bank.held_value());
        assert_eq!(restored.accounts(), bank.accounts());
        assert_eq!(restored.deposit_count(), 2);
        assert_eq!(restored.withdrawal_count(), 1);
        assert_eq!(restored.events(), bank.events());
    }

    #[test]
    fn test_restored_bank_continues_sequence() {
        let bank = populated();
        let mut restored = Bank::from_snapshot(bank.snapshot()).unwrap();

        restored
            .deposit(&AccountId::from("carol"), Amount::units(1))
            .unwrap();

        assert_eq!(restored.events().last().unwrap().sequence, 4);
    }

    #[test]
    fn test_unbalanced_snapshot_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.held = Amount::units(1_000);

        let result = Bank::from_snapshot(snapshot);

        assert!(matches!(result, Err(SnapshotError::Unbalanced { .. })));
    }

    #[test]
    fn test_overflowing_balances_rejected() {
        let mut snapshot = Bank::new(Amount::new(u128::MAX)).snapshot();
        snapshot.held = Amount::new(u128::MAX);
        snapshot
            .balances
            .insert(AccountId::from("alice"), Amount::new(u128::MAX));
        snapshot.balances.insert(AccountId::from("bob"), Amount::new(1));

        assert_eq!(
            Bank::from_snapshot(snapshot).unwrap_err(),
            SnapshotError::LiabilitiesOverflow
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.version = 99;

        assert_eq!(
            Bank::from_snapshot(snapshot).unwrap_err(),
            SnapshotError::UnsupportedVersion {
                found: 99,
                expected: SNAPSHOT_VERSION
            }
        );
    }

    #[test]
    fn test_sequence_ahead_rejected() {
        let mut snapshot = populated().snapshot();
        snapshot.last_sequence = 1;

        assert!(matches!(
            Bank::from_snapshot(snapshot),
            Err(SnapshotError::SequenceAhead { .. })
        ));
    }
}
