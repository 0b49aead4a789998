//! The delegation engine: entry point for every account operation.
//!
//! The engine owns both execution contexts and routes each call through an
//! [`AccountExecutor`] picked from the current delegation state. It also
//! runs the two ledger clocks, so tests can warp either side independently.

use std::collections::HashMap;

use crate::address::{user_account_address, Address, Identity};
use crate::commit::Coordinator;
use crate::config::Config;
use crate::delegate::DelegationManager;
use crate::errors::{CoreError, CoreResult};
use crate::events::Event;
use crate::executor::{AccountExecutor, BaseLedgerExecutor, EphemeralExecutor, ExecutionContext};
use crate::oracle::{derive_value, OracleBridge, PendingRequest, RequestKind};
use crate::session::EphemeralSession;
use crate::state::{DelegationMetadata, DelegationRecord, UserAccount};
use crate::store::AccountStore;

pub struct DelegationEngine {
    config: Config,
    store: AccountStore,
    base_oracle: OracleBridge,
    ephemeral_oracle: OracleBridge,
    delegations: DelegationManager,
    sessions: HashMap<Address, EphemeralSession>,
    base_slot: u64,
    ephemeral_slot: u64,
    events: Vec<Event>,
}

impl DelegationEngine {
    pub fn new(config: Config) -> Self {
        let base_oracle =
            OracleBridge::new(ExecutionContext::Base, config.oracle_identity, config.oracle_timeout_slots);
        let ephemeral_oracle =
            OracleBridge::new(ExecutionContext::Ephemeral, config.oracle_identity, config.oracle_timeout_slots);
        Self {
            store: AccountStore::new(config.account_reserve),
            base_oracle,
            ephemeral_oracle,
            delegations: DelegationManager::new(),
            sessions: HashMap::new(),
            base_slot: 1,
            ephemeral_slot: 1,
            config,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The account address this engine derives for `owner`.
    pub fn user_address(&self, owner: &Identity) -> Address {
        user_account_address(owner, self.config.derivation_version)
    }

    // ---- clocks and funding -------------------------------------------

    pub fn slot(&self, context: ExecutionContext) -> u64 {
        match context {
            ExecutionContext::Base => self.base_slot,
            ExecutionContext::Ephemeral => self.ephemeral_slot,
        }
    }

    pub fn warp_to_slot(&mut self, context: ExecutionContext, slot: u64) {
        match context {
            ExecutionContext::Base => self.base_slot = slot,
            ExecutionContext::Ephemeral => self.ephemeral_slot = slot,
        }
        log::debug!("warped {context} clock to slot {slot}");
    }

    pub fn airdrop(&mut self, owner: &Identity, lamports: u64) {
        self.store.airdrop(owner, lamports);
    }

    pub fn balance(&self, owner: &Identity) -> u64 {
        self.store.balance(owner)
    }

    // ---- lifecycle ----------------------------------------------------

    /// Creates the account for `owner` at its derived address, value zero.
    pub fn initialize(&mut self, owner: &Identity) -> CoreResult<Address> {
        let address = self.user_address(owner);
        let account = UserAccount::new(*owner, self.config.derivation_version);
        self.store.create(address, &account)?;
        self.events.push(Event::Initialized { account: address, owner: *owner });
        log::info!("initialized account {address} for {owner}");
        Ok(address)
    }

    /// The durable record as stored on the base ledger. While delegated this
    /// stays on the last committed state, not the live session state.
    pub fn read(&self, owner: &Identity) -> CoreResult<UserAccount> {
        self.store.get(&self.user_address(owner))
    }

    /// The value a reader should act on: the session copy while delegated,
    /// the base copy otherwise.
    pub fn authoritative_value(&self, owner: &Identity) -> CoreResult<u64> {
        let address = self.user_address(owner);
        if let Some(session) = self.sessions.get(&address) {
            return Ok(session.value());
        }
        Ok(self.store.get(&address)?.value)
    }

    /// Closes the account and returns the reserve to the owner. Refused
    /// while a delegation record exists; undelegate first.
    pub fn close(&mut self, owner: &Identity) -> CoreResult<()> {
        let address = self.user_address(owner);
        if !self.store.contains(&address) {
            return Err(CoreError::NotFound);
        }
        if self.delegations.is_delegated(&address) {
            return Err(CoreError::DelegationActive);
        }
        // A pending base request dies with the account.
        self.base_oracle.cancel(&address);
        let account = self.store.close(&address)?;
        self.events.push(Event::Closed { account: address, owner: account.owner });
        Ok(())
    }

    // ---- value updates ------------------------------------------------

    /// Requests oracle randomness for the account in whichever context it
    /// currently lives. The value lands later, via [`Self::callback_rand_update`].
    pub fn update(&mut self, owner: &Identity) -> CoreResult<()> {
        let address = self.user_address(owner);
        let context = {
            let mut executor = self.executor_for(&address)?;
            executor.request_randomness(RequestKind::Update)?;
            executor.context()
        };
        self.events.push(Event::RandomnessRequested { account: address, context, kind: RequestKind::Update });
        Ok(())
    }

    /// Requests randomness in the session and schedules the result to be
    /// anchored to the base copy when the callback lands. Session-only.
    pub fn update_commit(&mut self, owner: &Identity) -> CoreResult<()> {
        let address = self.user_address(owner);
        if !self.delegations.is_delegated(&address) {
            if !self.store.contains(&address) {
                return Err(CoreError::NotFound);
            }
            return Err(CoreError::NoActiveDelegation);
        }
        let context = {
            let mut executor = self.executor_for(&address)?;
            executor.request_randomness(RequestKind::UpdateCommit)?;
            executor.context()
        };
        self.events.push(Event::RandomnessRequested {
            account: address,
            context,
            kind: RequestKind::UpdateCommit,
        });
        Ok(())
    }

    /// Oracle callback: applies the randomness-derived value to the account
    /// and, for an update-commit request, anchors it to the base copy in the
    /// same step. Only the configured oracle identity gets past the gate.
    pub fn callback_rand_update(
        &mut self,
        owner: &Identity,
        randomness: [u8; 32],
        caller: &Identity,
    ) -> CoreResult<u64> {
        let address = self.user_address(owner);
        let (request, value, context) = {
            let mut executor = self.executor_for(&address)?;
            let request = executor.consume_randomness(caller)?;
            let value = derive_value(&randomness);
            executor.write_value(value)?;
            (request, value, executor.context())
        };
        let anchor = request.kind == RequestKind::UpdateCommit;
        if anchor {
            let slot = self.ephemeral_slot;
            self.coordinator().anchor_value(&address, value, slot)?;
        }
        self.events.push(Event::RandomnessFulfilled { account: address, context, value });
        if anchor {
            self.events.push(Event::Committed { account: address, value });
        }
        log::info!("randomness consumed for {address} on {context}, value {value}");
        Ok(value)
    }

    /// Writes `value` directly, no oracle involved.
    pub fn set_value(&mut self, owner: &Identity, value: u64) -> CoreResult<()> {
        let address = self.user_address(owner);
        let context = {
            let mut executor = self.executor_for(&address)?;
            executor.write_value(value)?;
            executor.context()
        };
        self.events.push(Event::ValueSet { account: address, context, value });
        Ok(())
    }

    // ---- delegation ---------------------------------------------------

    /// Hands the account to an ephemeral session run by `validator`. The
    /// base copy freezes at its current state; a snapshot of it is sealed
    /// into the undelegation buffer.
    pub fn delegate(&mut self, owner: &Identity, validator: &Identity) -> CoreResult<()> {
        let address = self.user_address(owner);
        let snapshot = match self.store.raw(&address) {
            Some(bytes) => bytes.to_vec(),
            None => return Err(CoreError::NotFound),
        };
        if self.delegations.is_delegated(&address) {
            return Err(CoreError::AlreadyDelegated);
        }
        let account = UserAccount::from_bytes(&snapshot)?;
        // A base-context request must not fire into the frozen copy later.
        self.base_oracle.cancel(&address);
        self.delegations.delegate(address, *owner, *validator, snapshot, self.base_slot)?;
        self.sessions.insert(
            address,
            EphemeralSession::open(address, *validator, account, self.ephemeral_slot),
        );
        self.events.push(Event::Delegated { account: address, validator: *validator });
        Ok(())
    }

    /// Anchors the current session value to the base copy without ending
    /// the delegation.
    pub fn commit(&mut self, owner: &Identity) -> CoreResult<u64> {
        let address = self.user_address(owner);
        if !self.store.contains(&address) {
            return Err(CoreError::NotFound);
        }
        let session = self.sessions.get(&address).ok_or(CoreError::NoActiveDelegation)?;
        if session.is_closing() {
            return Err(CoreError::UndelegationPending);
        }
        let value = session.value();
        let slot = self.ephemeral_slot;
        self.coordinator().anchor_value(&address, value, slot)?;
        self.events.push(Event::Committed { account: address, value });
        Ok(value)
    }

    /// First half of the undelegation handshake: freezes the session and
    /// drops any randomness request it still had in flight.
    pub fn undelegate(&mut self, owner: &Identity) -> CoreResult<()> {
        let address = self.user_address(owner);
        if !self.store.contains(&address) {
            return Err(CoreError::NotFound);
        }
        self.coordinator().begin_undelegation(&address)?;
        // A callback arriving after the freeze must find nothing to claim.
        self.ephemeral_oracle.cancel(&address);
        self.events.push(Event::UndelegationRequested { account: address });
        Ok(())
    }

    /// Second half, called by the settlement identity with the seed list
    /// that re-derives `account`. Writes the session's final state to the
    /// base ledger and removes record, metadata, buffer and session.
    pub fn process_undelegation(
        &mut self,
        account: &Address,
        seeds: &[Vec<u8>],
        caller: &Identity,
    ) -> CoreResult<UserAccount> {
        let settlement = self.config.settlement_identity;
        let final_state = Coordinator {
            store: &mut self.store,
            delegations: &mut self.delegations,
            sessions: &mut self.sessions,
        }
        .finalize_undelegation(account, seeds, caller, &settlement)?;
        self.events.push(Event::Undelegated { account: *account, value: final_state.value });
        Ok(final_state)
    }

    // ---- introspection ------------------------------------------------

    pub fn is_delegated(&self, owner: &Identity) -> bool {
        self.delegations.is_delegated(&self.user_address(owner))
    }

    pub fn delegation_record(&self, owner: &Identity) -> Option<&DelegationRecord> {
        self.delegations.record(&self.user_address(owner))
    }

    pub fn delegation_metadata(&self, owner: &Identity) -> Option<&DelegationMetadata> {
        self.delegations.metadata(&self.user_address(owner))
    }

    pub fn pending_request(&self, owner: &Identity, context: ExecutionContext) -> Option<PendingRequest> {
        let address = self.user_address(owner);
        match context {
            ExecutionContext::Base => self.base_oracle.pending(&address).copied(),
            ExecutionContext::Ephemeral => self.ephemeral_oracle.pending(&address).copied(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ---- internals ----------------------------------------------------

    /// Picks the executor for the account's current context. Delegated
    /// accounts run in the session; everything else on the base ledger.
    fn executor_for(&mut self, address: &Address) -> CoreResult<Box<dyn AccountExecutor + '_>> {
        if self.delegations.is_delegated(address) {
            let session = self.sessions.get_mut(address).ok_or(CoreError::NoActiveDelegation)?;
            Ok(Box::new(EphemeralExecutor::new(session, &mut self.ephemeral_oracle, self.ephemeral_slot)))
        } else if self.store.contains(address) {
            Ok(Box::new(BaseLedgerExecutor::new(
                &mut self.store,
                &mut self.base_oracle,
                *address,
                self.base_slot,
            )))
        } else {
            Err(CoreError::NotFound)
        }
    }

    fn coordinator(&mut self) -> Coordinator<'_> {
        Coordinator {
            store: &mut self.store,
            delegations: &mut self.delegations,
            sessions: &mut self.sessions,
        }
    }
}
