use borsh::{BorshDeserialize, BorshSerialize};

use crate::errors::CoreResult;
use crate::state::UserAccount;

/// Frozen byte snapshot of an account, taken at delegation time.
///
/// The buffer is written once by `delegate` and consumed once by
/// `process_undelegation`. Nothing else reads or writes it.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BufferAccount {
    pub snapshot: Vec<u8>,
}

impl BufferAccount {
    pub fn new(snapshot: Vec<u8>) -> Self {
        Self { snapshot }
    }

    /// Decodes the snapshot back into the record it was taken from.
    pub fn snapshot_account(&self) -> CoreResult<UserAccount> {
        UserAccount::from_bytes(&self.snapshot)
    }

    /// The value the account held when it was frozen.
    pub fn snapshot_value(&self) -> CoreResult<u64> {
        Ok(self.snapshot_account()?.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Identity;

    #[test]
    fn snapshot_round_trips_the_record() {
        let mut account = UserAccount::new(Identity::new_unique(), 255);
        account.value = 42;
        let buffer = BufferAccount::new(account.to_bytes().unwrap());
        assert_eq!(buffer.snapshot_account().unwrap(), account);
        assert_eq!(buffer.snapshot_value().unwrap(), 42);
    }
}
