//! Ephemeral session: the fast working copy of a delegated account.
//!
//! A session opens when the account is delegated and is torn down by
//! settlement. Once the owner requests an exit the copy freezes; the final
//! state is only handed out after that point.

use crate::address::{Address, Identity};
use crate::errors::{CoreError, CoreResult};
use crate::state::UserAccount;

pub struct EphemeralSession {
    account: Address,
    validator: Identity,
    state: UserAccount,
    closing: bool,
}

impl EphemeralSession {
    pub fn open(account: Address, validator: Identity, state: UserAccount, now_slot: u64) -> Self {
        log::info!("session opened for {account} with validator {validator} at slot {now_slot}");
        Self {
            account,
            validator,
            state,
            closing: false,
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn validator(&self) -> &Identity {
        &self.validator
    }

    pub fn value(&self) -> u64 {
        self.state.value
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn write_value(&mut self, value: u64) -> CoreResult<()> {
        if self.closing {
            return Err(CoreError::UndelegationPending);
        }
        self.state.value = value;
        Ok(())
    }

    /// Freezes the session. Repeated exit requests are rejected so the
    /// caller learns the first one already went through.
    pub fn request_exit(&mut self) -> CoreResult<()> {
        if self.closing {
            return Err(CoreError::UndelegationPending);
        }
        self.closing = true;
        log::info!("exit requested for session {}", self.account);
        Ok(())
    }

    /// The state settlement writes back. Only available once the session
    /// is frozen.
    pub fn final_state(&self) -> CoreResult<&UserAccount> {
        if !self.closing {
            return Err(CoreError::UndelegationNotRequested);
        }
        Ok(&self.state)
    }
}
