//! Commit and undelegation reconciliation.
//!
//! The coordinator is the only writer that touches the base copy while a
//! delegation is active, and the only code path that tears a delegation
//! down. Every check runs before the first mutation so a rejected call
//! leaves no partial state behind.

use std::collections::HashMap;

use crate::address::{derive_address, Address, Identity};
use crate::delegate::DelegationManager;
use crate::errors::{CoreError, CoreResult};
use crate::session::EphemeralSession;
use crate::state::UserAccount;
use crate::store::AccountStore;

pub struct Coordinator<'a> {
    pub store: &'a mut AccountStore,
    pub delegations: &'a mut DelegationManager,
    pub sessions: &'a mut HashMap<Address, EphemeralSession>,
}

impl Coordinator<'_> {
    /// Anchors `value` to the frozen base copy of a delegated account and
    /// records the commit in the delegation metadata.
    pub fn anchor_value(&mut self, account: &Address, value: u64, now_slot: u64) -> CoreResult<()> {
        if !self.delegations.is_delegated(account) {
            return Err(CoreError::NoActiveDelegation);
        }
        let mut base_copy = self.store.get(account)?;
        base_copy.value = value;
        self.store.write(account, &base_copy)?;
        self.delegations.metadata_mut(account)?.record_commit(value, now_slot);
        log::info!("committed value {value} for {account} to the base copy");
        Ok(())
    }

    /// First half of the undelegation handshake: freezes the session.
    pub fn begin_undelegation(&mut self, account: &Address) -> CoreResult<()> {
        if !self.delegations.is_delegated(account) {
            return Err(CoreError::NoActiveDelegation);
        }
        let session = self.sessions.get_mut(account).ok_or(CoreError::NoActiveDelegation)?;
        session.request_exit()
    }

    /// Second half, driven by the settlement identity: verifies the seeds,
    /// checks the base copy against the delegation bookkeeping, writes the
    /// session's final state back and clears every delegation artifact.
    pub fn finalize_undelegation(
        &mut self,
        account: &Address,
        seeds: &[Vec<u8>],
        caller: &Identity,
        settlement_identity: &Identity,
    ) -> CoreResult<UserAccount> {
        if caller != settlement_identity {
            return Err(CoreError::Unauthorized);
        }
        if !self.delegations.is_delegated(account) {
            return Err(CoreError::NoActiveDelegation);
        }

        let seed_refs: Vec<&[u8]> = seeds.iter().map(|seed| seed.as_slice()).collect();
        if derive_address(&seed_refs) != *account {
            return Err(CoreError::SeedMismatch);
        }

        let session = self.sessions.get(account).ok_or(CoreError::NoActiveDelegation)?;
        let validator = *session.validator();
        let final_state = *session.final_state()?;

        // The base copy was frozen at delegation and may only have moved
        // through commits. Anything else means foul play.
        let metadata = self.delegations.metadata(account).ok_or(CoreError::NoActiveDelegation)?;
        let expected = match metadata.last_committed_value {
            Some(value) => value,
            None => self.delegations.buffer_for(account)?.snapshot_value()?,
        };
        let base_copy = self.store.get(account)?;
        if base_copy.value != expected {
            log::error!(
                "base copy of {account} holds {} but bookkeeping expected {expected}",
                base_copy.value
            );
            return Err(CoreError::StaleBufferState);
        }

        self.store.write(account, &final_state)?;
        self.delegations.clear(account)?;
        self.sessions.remove(account);
        log::info!(
            "undelegated {account} from validator {validator}, final value {}",
            final_state.value
        );
        Ok(final_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{user_account_address, user_account_seeds};

    const RESERVE: u64 = 1_000;

    struct Fixture {
        store: AccountStore,
        delegations: DelegationManager,
        sessions: HashMap<Address, EphemeralSession>,
        owner: Identity,
        address: Address,
        settlement: Identity,
    }

    fn delegated_fixture() -> Fixture {
        let owner = Identity::new_unique();
        let validator = Identity::new_unique();
        let address = user_account_address(&owner, 255);
        let account = UserAccount::new(owner, 255);

        let mut store = AccountStore::new(RESERVE);
        store.airdrop(&owner, RESERVE);
        store.create(address, &account).unwrap();

        let mut delegations = DelegationManager::new();
        let snapshot = store.raw(&address).unwrap().to_vec();
        delegations.delegate(address, owner, validator, snapshot, 1).unwrap();

        let mut sessions = HashMap::new();
        sessions.insert(address, EphemeralSession::open(address, validator, account, 1));

        Fixture {
            store,
            delegations,
            sessions,
            owner,
            address,
            settlement: Identity::new_unique(),
        }
    }

    fn seeds_for(fixture: &Fixture) -> Vec<Vec<u8>> {
        user_account_seeds(&fixture.owner, 255).to_vec()
    }

    #[test]
    fn anchor_requires_a_delegation() {
        let mut fixture = delegated_fixture();
        let stray = user_account_address(&Identity::new_unique(), 255);
        let mut coordinator = Coordinator {
            store: &mut fixture.store,
            delegations: &mut fixture.delegations,
            sessions: &mut fixture.sessions,
        };
        assert_eq!(coordinator.anchor_value(&stray, 1, 2), Err(CoreError::NoActiveDelegation));
    }

    #[test]
    fn tampered_base_copy_fails_settlement() {
        let mut fixture = delegated_fixture();
        let seeds = seeds_for(&fixture);

        // A write that bypassed the commit path moves the frozen copy
        let mut tampered = fixture.store.get(&fixture.address).unwrap();
        tampered.value = 999;
        fixture.store.write(&fixture.address, &tampered).unwrap();

        fixture.sessions.get_mut(&fixture.address).unwrap().request_exit().unwrap();
        let settlement = fixture.settlement;
        let mut coordinator = Coordinator {
            store: &mut fixture.store,
            delegations: &mut fixture.delegations,
            sessions: &mut fixture.sessions,
        };
        let err = coordinator.finalize_undelegation(&fixture.address, &seeds, &settlement, &settlement);
        assert_eq!(err, Err(CoreError::StaleBufferState));
    }

    #[test]
    fn settlement_checks_against_the_last_commit_not_the_snapshot() {
        let mut fixture = delegated_fixture();
        let seeds = seeds_for(&fixture);
        let settlement = fixture.settlement;

        fixture.sessions.get_mut(&fixture.address).unwrap().write_value(50).unwrap();
        let mut coordinator = Coordinator {
            store: &mut fixture.store,
            delegations: &mut fixture.delegations,
            sessions: &mut fixture.sessions,
        };
        coordinator.anchor_value(&fixture.address, 50, 2).unwrap();

        coordinator.sessions.get_mut(&fixture.address).unwrap().request_exit().unwrap();
        let final_state = coordinator
            .finalize_undelegation(&fixture.address, &seeds, &settlement, &settlement)
            .unwrap();
        assert_eq!(final_state.value, 50);
    }

    #[test]
    fn failed_settlement_leaves_everything_in_place() {
        let mut fixture = delegated_fixture();
        let seeds = seeds_for(&fixture);
        let settlement = fixture.settlement;
        let impostor = Identity::new_unique();

        fixture.sessions.get_mut(&fixture.address).unwrap().request_exit().unwrap();
        let mut coordinator = Coordinator {
            store: &mut fixture.store,
            delegations: &mut fixture.delegations,
            sessions: &mut fixture.sessions,
        };
        let err = coordinator.finalize_undelegation(&fixture.address, &seeds, &impostor, &settlement);
        assert_eq!(err, Err(CoreError::Unauthorized));
        assert!(coordinator.delegations.is_delegated(&fixture.address));
        assert!(coordinator.sessions.contains_key(&fixture.address));
    }
}
