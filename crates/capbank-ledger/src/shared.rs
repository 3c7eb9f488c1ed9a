//! A bank shared between async tasks
//!
//! One global exclusive lock is held for the whole of each operation, which
//! gives multi-task hosts the same serialized-invocation model the bank
//! assumes. Reentrant calls made by a recipient go through the `&mut Bank`
//! it is handed and never touch the lock again.

use std::sync::Arc;

use capbank_types::{AccountId, Amount, EventRecord, Result};
use tokio::sync::Mutex;

use crate::bank::{Bank, Reconciliation};
use crate::recipient::Recipient;

#[derive(Clone)]
pub struct SharedBank {
    inner: Arc<Mutex<Bank>>,
}

impl SharedBank {
    pub fn new(bank: Bank) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bank)),
        }
    }

    pub async fn deposit(&self, caller: &AccountId, value: Amount) -> Result<()> {
        self.inner.lock().await.deposit(caller, value)
    }

    pub async fn withdraw<R: Recipient>(
        &self,
        caller: &AccountId,
        amount: Amount,
        recipient: &mut R,
    ) -> Result<()> {
        let mut bank = self.inner.lock().await;
        bank.withdraw(caller, amount, recipient)
    }

    pub async fn balance_of(&self, account: &AccountId) -> Amount {
        self.inner.lock().await.balance_of(account)
    }

    pub async fn reconcile(&self) -> Reconciliation {
        self.inner.lock().await.reconcile()
    }

    pub async fn drain_events(&self) -> Vec<EventRecord> {
        self.inner.lock().await.drain_events()
    }

    /// Run `f` with exclusive access to the bank
    pub async fn with_bank<T>(&self, f: impl FnOnce(&mut Bank) -> T) -> T {
        let mut bank = self.inner.lock().await;
        f(&mut *bank)
    }
}
