//! Identity types for capbank
//!
//! Accounts are keyed by the caller identity supplied by the host. The bank
//! never mints identities itself, so the wrapper is a plain string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a caller operating on its own balance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_serializes_as_plain_string() {
        let id = AccountId::from("alice");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
        assert_eq!(id.to_string(), "alice");
    }
}
