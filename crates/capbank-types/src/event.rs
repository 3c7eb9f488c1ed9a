//! Events emitted on successful bank operations
//!
//! Events are records for external observers. They are only ever produced by
//! an operation that completed; a rolled-back operation leaves no event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount};

/// Bank events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BankEvent {
    /// Value credited to an account
    Deposit { account: AccountId, amount: Amount },

    /// Value paid out to an account
    Withdrawal { account: AccountId, amount: Amount },
}

impl BankEvent {
    pub fn account(&self) -> &AccountId {
        match self {
            Self::Deposit { account, .. } | Self::Withdrawal { account, .. } => account,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::Deposit { amount, .. } | Self::Withdrawal { amount, .. } => *amount,
        }
    }
}

/// A journaled event with its position in the bank's event sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonically increasing, starting at 1
    pub sequence: u64,
    pub event: BankEvent,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = BankEvent::Withdrawal {
            account: AccountId::from("alice"),
            amount: Amount::units(1),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "withdrawal");
        assert_eq!(json["account"], "alice");
        assert_eq!(json["amount"], "1000000000000000000");
        assert_eq!(event.amount(), Amount::units(1));
    }
}
