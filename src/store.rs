//! Durable base ledger: address-keyed account bytes plus owner balances.
//!
//! The store knows nothing about delegation. Callers decide whether a write
//! is legal; the store only enforces existence, funding and byte integrity.

use std::collections::HashMap;

use crate::address::{Address, Identity};
use crate::errors::{CoreError, CoreResult};
use crate::state::UserAccount;

pub struct AccountStore {
    accounts: HashMap<Address, Vec<u8>>,
    balances: HashMap<Identity, u64>,
    /// Lamports debited on create and returned on close.
    reserve: u64,
}

impl AccountStore {
    pub fn new(reserve: u64) -> Self {
        Self {
            accounts: HashMap::new(),
            balances: HashMap::new(),
            reserve,
        }
    }

    pub fn airdrop(&mut self, owner: &Identity, lamports: u64) {
        let balance = self.balances.entry(*owner).or_insert(0);
        *balance = balance.saturating_add(lamports);
        log::debug!("airdropped {lamports} lamports to {owner}");
    }

    pub fn balance(&self, owner: &Identity) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Creates the account and debits the reserve from its owner.
    /// Nothing is touched if the owner cannot cover the reserve.
    pub fn create(&mut self, address: Address, account: &UserAccount) -> CoreResult<()> {
        if self.accounts.contains_key(&address) {
            return Err(CoreError::AlreadyExists);
        }
        let balance = self.balance(&account.owner);
        if balance < self.reserve {
            return Err(CoreError::InsufficientFunds);
        }
        let bytes = account.to_bytes()?;
        self.balances.insert(account.owner, balance - self.reserve);
        self.accounts.insert(address, bytes);
        log::debug!("created account {address} for {}", account.owner);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> CoreResult<UserAccount> {
        let bytes = self.accounts.get(address).ok_or(CoreError::NotFound)?;
        UserAccount::from_bytes(bytes)
    }

    /// Raw stored bytes, for snapshotting at delegation time.
    pub fn raw(&self, address: &Address) -> Option<&[u8]> {
        self.accounts.get(address).map(Vec::as_slice)
    }

    pub fn write(&mut self, address: &Address, account: &UserAccount) -> CoreResult<()> {
        let bytes = account.to_bytes()?;
        let entry = self.accounts.get_mut(address).ok_or(CoreError::NotFound)?;
        *entry = bytes;
        Ok(())
    }

    /// Removes the account and returns the reserve to its owner.
    pub fn close(&mut self, address: &Address) -> CoreResult<UserAccount> {
        let bytes = self.accounts.remove(address).ok_or(CoreError::NotFound)?;
        let account = UserAccount::from_bytes(&bytes)?;
        let balance = self.balances.entry(account.owner).or_insert(0);
        *balance = balance.saturating_add(self.reserve);
        log::debug!("closed account {address}, reserve returned to {}", account.owner);
        Ok(account)
    }
}
