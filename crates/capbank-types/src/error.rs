//! Error types for capbank
//!
//! Every error is caller-visible and aborts the whole invocation: when an
//! operation returns one of these, no state it touched survives.

use crate::{AccountId, Amount};
use thiserror::Error;

/// Result type for bank operations
pub type Result<T> = std::result::Result<T, BankError>;

/// Caller-visible failure kinds of the bank
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    // ========================================================================
    // Deposit Errors
    // ========================================================================

    /// Deposited amount is zero
    #[error("Invalid deposit amount: deposits must carry a non-zero value")]
    InvalidDepositAmount,

    /// Held value after crediting the deposit exceeds the bank cap
    #[error("Deposit cap reached: held value {held} would exceed cap {cap}")]
    DepositCapReached { held: Amount, cap: Amount },

    // ========================================================================
    // Withdrawal Errors
    // ========================================================================

    /// Requested withdrawal is zero
    #[error("Invalid withdraw amount: withdrawals must be non-zero")]
    InvalidWithdrawAmount,

    /// Requested withdrawal exceeds the per-operation ceiling
    #[error("Withdraw limit exceeded: requested {requested}, limit {limit}")]
    WithdrawLimitExceeded { requested: Amount, limit: Amount },

    /// Caller balance is below the requested amount
    #[error("Insufficient balance for {account}: have {available}, need {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    /// The external value transfer did not succeed
    #[error("Transfer of {amount} to {account} failed: {reason}")]
    TransferFailed {
        account: AccountId,
        amount: Amount,
        reason: String,
    },
}

impl BankError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDepositAmount => "InvalidDepositAmount",
            Self::DepositCapReached { .. } => "DepositCapReached",
            Self::InvalidWithdrawAmount => "InvalidWithdrawAmount",
            Self::WithdrawLimitExceeded { .. } => "WithdrawLimitExceeded",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::TransferFailed { .. } => "TransferFailed",
        }
    }
}
