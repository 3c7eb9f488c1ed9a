//! capbank Types - Canonical domain types for the capped custodial bank
//!
//! This crate contains the foundational types shared by every capbank crate,
//! with zero dependencies on other capbank crates:
//!
//! - Account identity (`AccountId`)
//! - Base-unit amounts with 18-decimal whole units (`Amount`)
//! - Protocol constants (`UNIT`, `WITHDRAW_LIMIT`)
//! - The caller-visible error taxonomy (`BankError`)
//! - Events emitted on successful operations (`BankEvent`, `EventRecord`)
//!
//! # Invariants
//!
//! 1. Amounts are unsigned; no balance can go negative
//! 2. The withdrawal ceiling is identical for every account and operation
//! 3. Every failed operation surfaces exactly one `BankError` kind

pub mod identity;
pub mod amount;
pub mod error;
pub mod event;

pub use identity::*;
pub use amount::*;
pub use error::*;
pub use event::*;

/// Version of the capbank types schema
pub const TYPES_VERSION: &str = "0.1.0";
