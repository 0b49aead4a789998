use borsh::{BorshDeserialize, BorshSerialize};

use crate::address::Identity;
use crate::errors::{CoreError, CoreResult};

/// The per-user record every operation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UserAccount {
    pub owner: Identity,
    pub value: u64,
    pub bump: u8,
}

impl UserAccount {
    // 32 owner + 8 value + 1 bump
    pub const SPACE: usize = 32 + 8 + 1;

    pub fn new(owner: Identity, bump: u8) -> Self {
        Self { owner, value: 0, bump }
    }

    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|_| CoreError::CorruptAccount)
    }

    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        borsh::from_slice(bytes).map_err(|_| CoreError::CorruptAccount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account_starts_at_zero() {
        let account = UserAccount::new(Identity::new_unique(), 255);
        assert_eq!(account.value, 0);
        assert_eq!(account.bump, 255);
    }

    #[test]
    fn serialized_width_matches_space() {
        let account = UserAccount::new(Identity::new([9u8; 32]), 254);
        assert_eq!(account.to_bytes().unwrap().len(), UserAccount::SPACE);
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        let account = UserAccount::new(Identity::new_unique(), 255);
        let bytes = account.to_bytes().unwrap();
        assert_eq!(UserAccount::from_bytes(&bytes[..bytes.len() - 1]), Err(CoreError::CorruptAccount));
    }
}
