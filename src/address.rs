//! Identities and deterministic account addressing.
//!
//! Every actor (owner, validator, oracle, settlement authority) is a 32-byte
//! [`Identity`]. Account locations are 32-byte [`Address`]es derived from a
//! seed list, so the same owner always lands on the same account and two
//! distinct seed lists can never collide.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Seed tag for user account derivation.
pub const USER_SEED: &[u8] = b"user";
/// Seed tag for the undelegation buffer tied to a delegated account.
pub const BUFFER_SEED: &[u8] = b"buffer";

/// Domain tag mixed into every derivation so addresses from this crate
/// cannot collide with hashes produced elsewhere.
const ADDRESS_DOMAIN: &[u8] = b"er-delegation-core:v1";

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A 32-byte participant identity (owner, validator, oracle, settlement).
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Process-unique identity for tests and local setups.
    pub fn new_unique() -> Self {
        let n = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_short_hex(f, &self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity(")?;
        write_short_hex(f, &self.0)?;
        write!(f, ")")
    }
}

/// A 32-byte account address produced by [`derive_address`].
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_short_hex(f, &self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(")?;
        write_short_hex(f, &self.0)?;
        write!(f, ")")
    }
}

fn write_short_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8; 32]) -> fmt::Result {
    for b in &bytes[..4] {
        write!(f, "{b:02x}")?;
    }
    write!(f, "..")?;
    for b in &bytes[28..] {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

/// Derives an address from a seed list.
///
/// Each seed is length-prefixed before hashing, so `["ab", "c"]` and
/// `["a", "bc"]` derive different addresses. Total and deterministic:
/// every seed list yields exactly one address.
pub fn derive_address(seeds: &[&[u8]]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_DOMAIN);
    for seed in seeds {
        hasher.update((seed.len() as u32).to_le_bytes());
        hasher.update(seed);
    }
    Address(hasher.finalize().into())
}

/// Address of the user account for `owner` under derivation version `bump`.
pub fn user_account_address(owner: &Identity, bump: u8) -> Address {
    derive_address(&[USER_SEED, owner.as_ref(), &[bump]])
}

/// The seed list that re-derives a user account address, as owned bytes.
/// Settlement hands these back when finalizing an undelegation.
pub fn user_account_seeds(owner: &Identity, bump: u8) -> [Vec<u8>; 3] {
    [USER_SEED.to_vec(), owner.to_bytes().to_vec(), vec![bump]]
}

/// Address of the undelegation buffer shadowing `account`.
pub fn buffer_address(account: &Address) -> Address {
    derive_address(&[BUFFER_SEED, account.as_ref()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let owner = Identity::new([7u8; 32]);
        assert_eq!(user_account_address(&owner, 255), user_account_address(&owner, 255));
    }

    #[test]
    fn distinct_owners_get_distinct_addresses() {
        let a = user_account_address(&Identity::new_unique(), 255);
        let b = user_account_address(&Identity::new_unique(), 255);
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_separates_seed_boundaries() {
        let joined = derive_address(&[b"ab", b"c"]);
        let shifted = derive_address(&[b"a", b"bc"]);
        assert_ne!(joined, shifted);
    }

    #[test]
    fn bump_changes_the_address() {
        let owner = Identity::new_unique();
        assert_ne!(user_account_address(&owner, 255), user_account_address(&owner, 254));
    }

    #[test]
    fn seed_list_re_derives_the_account_address() {
        let owner = Identity::new_unique();
        let address = user_account_address(&owner, 255);
        let seeds = user_account_seeds(&owner, 255);
        let refs: Vec<&[u8]> = seeds.iter().map(|s| s.as_slice()).collect();
        assert_eq!(derive_address(&refs), address);
    }

    #[test]
    fn buffer_address_differs_from_its_account() {
        let account = user_account_address(&Identity::new_unique(), 255);
        assert_ne!(buffer_address(&account), account);
    }
}
