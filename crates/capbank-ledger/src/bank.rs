//! The bank: balances, counters, cap, and the deposit/withdraw operations

use std::collections::HashMap;

use capbank_types::{AccountId, Amount, BankError, BankEvent, EventRecord, Result, WITHDRAW_LIMIT};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::recipient::Recipient;

/// Deepest invocation a withdrawal may run at
///
/// A recipient that keeps reentering `withdraw` gets a `TransferFailed` once
/// the nesting goes past this depth, and that withdrawal rolls back.
pub const MAX_CALL_DEPTH: u32 = 128;

/// Mutable ledger state
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) balances: HashMap<AccountId, Amount>,
    /// Value currently in the bank's custody
    pub(crate) held: Amount,
    pub(crate) total_deposits: u64,
    pub(crate) total_withdrawals: u64,
    pub(crate) journal: Vec<EventRecord>,
    /// Sequence number of the last recorded event
    pub(crate) last_sequence: u64,
}

/// Marks taken when an invocation starts; restoring them undoes it
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    held: Amount,
    total_deposits: u64,
    total_withdrawals: u64,
    last_sequence: u64,
    journal_len: usize,
    undo_len: usize,
}

/// Books check: held value against what the bank owes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub held: Amount,
    /// Sum of all account balances, `None` if it does not fit in an `Amount`
    pub liabilities: Option<Amount>,
    pub endowment: Amount,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.liabilities
            .and_then(|owed| owed.checked_add(self.endowment))
            == Some(self.held)
    }
}

/// The capped custodial bank
///
/// Every public mutating operation runs inside a transactional frame: the
/// counters and journal length are marked on entry and every balance write
/// is logged, so a failure anywhere (including inside a recipient, or inside
/// operations the recipient reentered) discards the whole invocation.
#[derive(Debug)]
pub struct Bank {
    cap: Amount,
    endowment: Amount,
    pub(crate) state: LedgerState,
    /// Prior value of every balance entry written by the open invocations
    undo: Vec<(AccountId, Option<Amount>)>,
    depth: u32,
}

impl Bank {
    /// Create an empty bank with a fixed cap
    pub fn new(cap: Amount) -> Self {
        Self::with_endowment(cap, Amount::zero())
    }

    /// Create a bank that receives `endowment` at construction
    ///
    /// The endowment is held by the bank but owed to nobody. It counts
    /// toward the cap check of every later deposit.
    pub fn with_endowment(cap: Amount, endowment: Amount) -> Self {
        info!(cap = %cap, endowment = %endowment, "bank created");
        Self::from_parts(
            cap,
            endowment,
            LedgerState {
                held: endowment,
                ..LedgerState::default()
            },
        )
    }

    pub(crate) fn from_parts(cap: Amount, endowment: Amount, state: LedgerState) -> Self {
        Self {
            cap,
            endowment,
            state,
            undo: Vec::new(),
            depth: 0,
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Credit `value` attached to the call to the caller's balance
    pub fn deposit(&mut self, caller: &AccountId, value: Amount) -> Result<()> {
        self.atomically("deposit", |bank| {
            // The attached value is in custody before any check runs.
            let Some(held) = bank.state.held.checked_add(value) else {
                return Err(BankError::DepositCapReached {
                    held: Amount::new(u128::MAX),
                    cap: bank.cap,
                });
            };
            bank.state.held = held;

            if value.is_zero() {
                return Err(BankError::InvalidDepositAmount);
            }
            if held > bank.cap {
                return Err(BankError::DepositCapReached { held, cap: bank.cap });
            }

            let balance = bank
                .balance_of(caller)
                .checked_add(value)
                .ok_or(BankError::DepositCapReached { held, cap: bank.cap })?;
            bank.set_balance(caller, balance);
            bank.state.total_deposits += 1;

            debug!(account = %caller, amount = %value, held = %held, "deposit accepted");
            bank.emit(BankEvent::Deposit {
                account: caller.clone(),
                amount: value,
            });
            Ok(())
        })
    }

    /// Pay `amount` out of the caller's balance through `recipient`
    ///
    /// Checks run in a fixed order: zero amount, per-operation limit, then
    /// balance. The balance and withdrawal counter are updated before the
    /// recipient is invoked; if the recipient refuses, everything is undone.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        recipient: &mut dyn Recipient,
    ) -> Result<()> {
        self.atomically("withdraw", |bank| {
            if amount.is_zero() {
                return Err(BankError::InvalidWithdrawAmount);
            }
            if amount > WITHDRAW_LIMIT {
                return Err(BankError::WithdrawLimitExceeded {
                    requested: amount,
                    limit: WITHDRAW_LIMIT,
                });
            }
            let available = bank.balance_of(caller);
            let remaining =
                available
                    .checked_sub(amount)
                    .ok_or_else(|| BankError::InsufficientBalance {
                        account: caller.clone(),
                        available,
                        requested: amount,
                    })?;

            // Effects
            bank.set_balance(caller, remaining);
            bank.state.total_withdrawals += 1;

            // Interaction
            let transfer_failed = |reason: String| BankError::TransferFailed {
                account: caller.clone(),
                amount,
                reason,
            };
            if bank.depth > MAX_CALL_DEPTH {
                return Err(transfer_failed(format!(
                    "call depth limit of {} reached",
                    MAX_CALL_DEPTH
                )));
            }
            bank.state.held = bank.state.held.checked_sub(amount).ok_or_else(|| {
                transfer_failed("custody holds less than the payout".to_string())
            })?;
            recipient
                .on_receive(bank, caller, amount)
                .map_err(|refused| transfer_failed(refused.reason))?;

            debug!(account = %caller, amount = %amount, remaining = %remaining, "withdrawal paid");
            bank.emit(BankEvent::Withdrawal {
                account: caller.clone(),
                amount,
            });
            Ok(())
        })
    }

    /// Current balance of an account (zero if it never deposited)
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.state
            .balances
            .get(account)
            .copied()
            .unwrap_or(Amount::zero())
    }

    // ========================================================================
    // Read-only state
    // ========================================================================

    pub fn bank_cap(&self) -> Amount {
        self.cap
    }

    pub fn endowment(&self) -> Amount {
        self.endowment
    }

    /// Total value currently in custody
    pub fn held_value(&self) -> Amount {
        self.state.held
    }

    pub fn deposit_count(&self) -> u64 {
        self.state.total_deposits
    }

    pub fn withdrawal_count(&self) -> u64 {
        self.state.total_withdrawals
    }

    /// Number of invocations currently on the stack (0 between invocations)
    pub fn call_depth(&self) -> u32 {
        self.depth
    }

    /// Accounts with a non-zero balance, ordered by identity
    pub fn accounts(&self) -> Vec<(AccountId, Amount)> {
        let mut accounts: Vec<_> = self
            .state
            .balances
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(id, balance)| (id.clone(), *balance))
            .collect();
        accounts.sort();
        accounts
    }

    pub fn reconcile(&self) -> Reconciliation {
        let liabilities = self
            .state
            .balances
            .values()
            .try_fold(Amount::zero(), |sum, b| sum.checked_add(*b));
        Reconciliation {
            held: self.state.held,
            liabilities,
            endowment: self.endowment,
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Recorded events, oldest first
    pub fn events(&self) -> &[EventRecord] {
        &self.state.journal
    }

    /// Take all recorded events, leaving the journal empty
    ///
    /// Sequence numbers keep counting from where they were. While an
    /// invocation is in progress its events may still be rolled back, so
    /// nothing is handed out and the journal is left alone.
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        if self.depth > 0 {
            return Vec::new();
        }
        std::mem::take(&mut self.state.journal)
    }

    fn emit(&mut self, event: BankEvent) {
        self.state.last_sequence += 1;
        self.state.journal.push(EventRecord {
            sequence: self.state.last_sequence,
            event,
            recorded_at: Utc::now(),
        });
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    fn set_balance(&mut self, account: &AccountId, balance: Amount) {
        let prior = self.state.balances.insert(account.clone(), balance);
        if self.depth > 0 {
            self.undo.push((account.clone(), prior));
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            held: self.state.held,
            total_deposits: self.state.total_deposits,
            total_withdrawals: self.state.total_withdrawals,
            last_sequence: self.state.last_sequence,
            journal_len: self.state.journal.len(),
            undo_len: self.undo.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        let undone = self.undo.split_off(checkpoint.undo_len);
        for (account, prior) in undone.into_iter().rev() {
            match prior {
                Some(balance) => {
                    self.state.balances.insert(account, balance);
                }
                None => {
                    self.state.balances.remove(&account);
                }
            }
        }
        self.state.held = checkpoint.held;
        self.state.total_deposits = checkpoint.total_deposits;
        self.state.total_withdrawals = checkpoint.total_withdrawals;
        self.state.last_sequence = checkpoint.last_sequence;
        self.state.journal.truncate(checkpoint.journal_len);
    }

    /// Run `op` in a frame that restores the entry state if it fails
    fn atomically<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let checkpoint = self.checkpoint();
        self.depth += 1;
        let outcome = op(self);
        self.depth -= 1;

        match &outcome {
            Err(err) => {
                self.restore(checkpoint);
                warn!(
                    operation,
                    depth = self.depth,
                    kind = err.kind(),
                    "invocation rolled back: {}",
                    err
                );
            }
            // nothing is left to undo once the outermost invocation commits
            Ok(_) if self.depth == 0 => self.undo.clear(),
            Ok(_) => {}
        }
        outcome
    }
}
