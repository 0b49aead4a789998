//! Runtime configuration injected at engine startup.
//!
//! The two privileged identities live here instead of being hardcoded, so a
//! deployment picks its real oracle and settlement authority while tests hand
//! in throwaway ones.

use serde::{Deserialize, Serialize};

use crate::address::Identity;

/// Slots a randomness request stays claimable before a retry may replace it.
pub const DEFAULT_ORACLE_TIMEOUT_SLOTS: u64 = 150;

/// Lamports reserved when a user account is created and returned on close.
/// Rent-exempt minimum for the 49-byte record: (49 + 128) * 3480 * 2.
pub const DEFAULT_ACCOUNT_RESERVE: u64 = 1_231_920;

/// Derivation version mixed into user account seeds. Counts downward like a
/// bump so a future scheme change cannot collide with existing accounts.
pub const DEFAULT_DERIVATION_VERSION: u8 = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The only identity allowed to deliver randomness callbacks.
    pub oracle_identity: Identity,
    /// The only identity allowed to finalize undelegations.
    pub settlement_identity: Identity,
    #[serde(default = "default_oracle_timeout_slots")]
    pub oracle_timeout_slots: u64,
    #[serde(default = "default_account_reserve")]
    pub account_reserve: u64,
    #[serde(default = "default_derivation_version")]
    pub derivation_version: u8,
}

impl Config {
    pub fn new(oracle_identity: Identity, settlement_identity: Identity) -> Self {
        Self {
            oracle_identity,
            settlement_identity,
            oracle_timeout_slots: DEFAULT_ORACLE_TIMEOUT_SLOTS,
            account_reserve: DEFAULT_ACCOUNT_RESERVE,
            derivation_version: DEFAULT_DERIVATION_VERSION,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn default_oracle_timeout_slots() -> u64 {
    DEFAULT_ORACLE_TIMEOUT_SLOTS
}

fn default_account_reserve() -> u64 {
    DEFAULT_ACCOUNT_RESERVE
}

fn default_derivation_version() -> u8 {
    DEFAULT_DERIVATION_VERSION
}
