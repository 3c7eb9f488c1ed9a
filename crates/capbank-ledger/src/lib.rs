//! capbank Ledger - Capped custodial ledger for a native value unit
//!
//! The ledger is:
//! - Account-keyed by `AccountId`
//! - Capped (total held value may not exceed the bank cap after a deposit)
//! - Rate-limited per operation (no withdrawal above `WITHDRAW_LIMIT`)
//! - Atomic (every invocation fully applies or leaves no trace)
//! - Reentrancy-safe by ordering (effects before interaction)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. Held value equals the sum of balances plus the construction endowment
//! 3. The bank cap never changes after construction
//! 4. Events are only recorded for operations that completed
//!
//! # Reentrancy
//!
//! A withdrawal pays out through a [`Recipient`], which receives `&mut Bank`
//! and may call back into any public operation before returning. The
//! caller's balance is already decremented when the recipient runs, so a
//! nested withdrawal can only spend what is actually left.

mod bank;
mod recipient;
mod shared;
mod snapshot;

pub use bank::{Bank, Reconciliation, MAX_CALL_DEPTH};
pub use recipient::{Recipient, RefusingRecipient, TransferRefused, Wallets};
pub use shared::SharedBank;
pub use snapshot::{BankSnapshot, SnapshotError, SNAPSHOT_VERSION};

pub use capbank_types::{BankError, Result};
