//! Delegation bookkeeping: records, metadata and undelegation buffers.
//!
//! A [`DelegationRecord`] exists exactly while its account is delegated.
//! The buffer snapshot taken at delegation time is sealed here; only
//! settlement may look at it, through the crate-private accessor.

use std::collections::HashMap;

use crate::address::{buffer_address, Address, Identity};
use crate::errors::{CoreError, CoreResult};
use crate::state::{BufferAccount, DelegationMetadata, DelegationRecord};

#[derive(Default)]
pub struct DelegationManager {
    records: HashMap<Address, DelegationRecord>,
    metadata: HashMap<Address, DelegationMetadata>,
    buffers: HashMap<Address, BufferAccount>,
}

impl DelegationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_delegated(&self, account: &Address) -> bool {
        self.records.contains_key(account)
    }

    pub fn record(&self, account: &Address) -> Option<&DelegationRecord> {
        self.records.get(account)
    }

    pub fn metadata(&self, account: &Address) -> Option<&DelegationMetadata> {
        self.metadata.get(account)
    }

    pub fn metadata_mut(&mut self, account: &Address) -> CoreResult<&mut DelegationMetadata> {
        self.metadata.get_mut(account).ok_or(CoreError::NoActiveDelegation)
    }

    /// Opens a delegation: writes the buffer snapshot, the metadata and the
    /// record in one step.
    pub fn delegate(
        &mut self,
        account: Address,
        authority: Identity,
        validator: Identity,
        snapshot: Vec<u8>,
        now_slot: u64,
    ) -> CoreResult<DelegationRecord> {
        if self.records.contains_key(&account) {
            return Err(CoreError::AlreadyDelegated);
        }
        let buffer_ref = buffer_address(&account);
        let record = DelegationRecord { account, validator, buffer_ref };
        self.buffers.insert(buffer_ref, BufferAccount::new(snapshot));
        self.metadata.insert(account, DelegationMetadata::new(authority, now_slot));
        self.records.insert(account, record);
        log::info!("delegated {account} to validator {validator}, buffer {buffer_ref}");
        Ok(record)
    }

    /// The sealed snapshot for `account`. Settlement-only.
    pub(crate) fn buffer_for(&self, account: &Address) -> CoreResult<&BufferAccount> {
        let record = self.records.get(account).ok_or(CoreError::NoActiveDelegation)?;
        self.buffers.get(&record.buffer_ref).ok_or(CoreError::NoActiveDelegation)
    }

    /// Tears the delegation down, returning everything that was tracked.
    pub fn clear(&mut self, account: &Address) -> CoreResult<(DelegationRecord, DelegationMetadata, BufferAccount)> {
        let record = self.records.remove(account).ok_or(CoreError::NoActiveDelegation)?;
        let metadata = self.metadata.remove(account).ok_or(CoreError::NoActiveDelegation)?;
        let buffer = self.buffers.remove(&record.buffer_ref).ok_or(CoreError::NoActiveDelegation)?;
        log::info!("delegation cleared for {account}");
        Ok((record, metadata, buffer))
    }
}
