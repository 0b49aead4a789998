use borsh::{BorshDeserialize, BorshSerialize};

use crate::address::{Address, Identity};

/// Marks an account as delegated and names the session validator.
/// Exists exactly while the delegation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DelegationRecord {
    pub account: Address,
    pub validator: Identity,
    pub buffer_ref: Address,
}

/// Bookkeeping that travels with a delegation but is not part of the record
/// handed to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct DelegationMetadata {
    /// Owner that initiated the delegation.
    pub authority: Identity,
    pub delegated_at_slot: u64,
    pub last_update_slot: u64,
    /// Value most recently anchored to the base copy, if any commit ran.
    pub last_committed_value: Option<u64>,
    pub commits: u32,
}

impl DelegationMetadata {
    pub fn new(authority: Identity, now_slot: u64) -> Self {
        Self {
            authority,
            delegated_at_slot: now_slot,
            last_update_slot: now_slot,
            last_committed_value: None,
            commits: 0,
        }
    }

    pub fn record_commit(&mut self, value: u64, now_slot: u64) {
        self.last_committed_value = Some(value);
        self.commits += 1;
        self.last_update_slot = now_slot;
    }
}
