//! The external side of a withdrawal
//!
//! A [`Recipient`] is whatever receives value paid out by the bank. It is
//! handed the bank itself, so it may reenter any public operation before it
//! returns; this is the only place control leaves the bank mid-operation.

use std::collections::BTreeMap;

use capbank_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::Bank;

/// A recipient declined (or failed to accept) a transfer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransferRefused {
    pub reason: String,
}

impl TransferRefused {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Receiver of value paid out by a withdrawal
pub trait Recipient {
    /// Accept `amount` for `to`
    ///
    /// When this runs, the bank has already debited `to` and released the
    /// value from custody. Returning an error makes the enclosing withdrawal
    /// fail with `TransferFailed` and discards everything it did, including
    /// any operations this method performed on `bank`. The recipient's own
    /// state is not covered by that rollback.
    fn on_receive(
        &mut self,
        bank: &mut Bank,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferRefused>;
}

/// External native holdings of accounts, outside the bank
///
/// Accepts every transfer and never calls back into the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallets {
    holdings: BTreeMap<AccountId, Amount>,
}

impl Wallets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(&self, account: &AccountId) -> Amount {
        self.holdings
            .get(account)
            .copied()
            .unwrap_or(Amount::zero())
    }

    /// Sum of all holdings
    pub fn total(&self) -> Amount {
        self.holdings.values().fold(Amount::zero(), |sum, h| {
            sum.checked_add(*h).unwrap_or(Amount::new(u128::MAX))
        })
    }
}

impl Recipient for Wallets {
    fn on_receive(
        &mut self,
        _bank: &mut Bank,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferRefused> {
        let holding = self.holdings.entry(to.clone()).or_default();
        *holding = holding
            .checked_add(amount)
            .ok_or_else(|| TransferRefused::new(format!("holding of {to} would overflow")))?;
        Ok(())
    }
}

/// A recipient that refuses every transfer
#[derive(Debug, Clone)]
pub struct RefusingRecipient {
    reason: String,
}

impl RefusingRecipient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Recipient for RefusingRecipient {
    fn on_receive(
        &mut self,
        _bank: &mut Bank,
        _to: &AccountId,
        _amount: Amount,
    ) -> Result<(), TransferRefused> {
        Err(TransferRefused::new(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallets_accumulate_payouts() {
        let mut bank = Bank::new(Amount::units(100));
        let mut wallets = Wallets::new();
        let alice = AccountId::from("alice");

        wallets.on_receive(&mut bank, &alice, Amount::units(2)).unwrap();
        wallets.on_receive(&mut bank, &alice, Amount::units(3)).unwrap();

        assert_eq!(wallets.holding(&alice), Amount::units(5));
        assert_eq!(wallets.total(), Amount::units(5));
        assert_eq!(wallets.holding(&AccountId::from("bob")), Amount::zero());
    }

    #[test]
    fn test_wallets_refuse_overflow() {
        let mut bank = Bank::new(Amount::units(100));
        let mut wallets = Wallets::new();
        let alice = AccountId::from("alice");
        wallets
            .on_receive(&mut bank, &alice, Amount::new(u128::MAX))
            .unwrap();

        let refused = wallets.on_receive(&mut bank, &alice, Amount::new(1));

        assert!(refused.is_err());
        assert_eq!(wallets.holding(&alice), Amount::new(u128::MAX));
    }
}
