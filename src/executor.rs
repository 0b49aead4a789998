//! One state-machine interface, two execution contexts.
//!
//! [`AccountExecutor`] is the seam between "what happens to the account" and
//! "where it happens". The engine picks the implementation from the current
//! delegation state: [`BaseLedgerExecutor`] works on the durable record,
//! [`EphemeralExecutor`] on the session copy. Callers never branch on
//! context themselves.

use std::fmt;

use crate::address::{Address, Identity};
use crate::errors::{CoreError, CoreResult};
use crate::oracle::{OracleBridge, PendingRequest, RequestKind};
use crate::session::EphemeralSession;
use crate::store::AccountStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    Base,
    Ephemeral,
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Base => write!(f, "base ledger"),
            ExecutionContext::Ephemeral => write!(f, "ephemeral rollup"),
        }
    }
}

pub trait AccountExecutor {
    fn context(&self) -> ExecutionContext;

    fn slot(&self) -> u64;

    fn value(&self) -> CoreResult<u64>;

    fn write_value(&mut self, value: u64) -> CoreResult<()>;

    /// Registers a randomness request with this context's oracle queue.
    fn request_randomness(&mut self, kind: RequestKind) -> CoreResult<()>;

    /// Claims the pending randomness request after verifying the caller.
    fn consume_randomness(&mut self, caller: &Identity) -> CoreResult<PendingRequest>;
}

/// Executes against the durable record. Only constructed while the account
/// is not delegated.
pub struct BaseLedgerExecutor<'a> {
    store: &'a mut AccountStore,
    oracle: &'a mut OracleBridge,
    address: Address,
    slot: u64,
}

impl<'a> BaseLedgerExecutor<'a> {
    pub fn new(store: &'a mut AccountStore, oracle: &'a mut OracleBridge, address: Address, slot: u64) -> Self {
        Self { store, oracle, address, slot }
    }
}

impl AccountExecutor for BaseLedgerExecutor<'_> {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Base
    }

    fn slot(&self) -> u64 {
        self.slot
    }

    fn value(&self) -> CoreResult<u64> {
        Ok(self.store.get(&self.address)?.value)
    }

    fn write_value(&mut self, value: u64) -> CoreResult<()> {
        let mut account = self.store.get(&self.address)?;
        account.value = value;
        self.store.write(&self.address, &account)
    }

    fn request_randomness(&mut self, kind: RequestKind) -> CoreResult<()> {
        // Commit-on-callback only means something inside a session.
        if kind == RequestKind::UpdateCommit {
            return Err(CoreError::NoActiveDelegation);
        }
        self.oracle.submit(self.address, kind, self.slot)
    }

    fn consume_randomness(&mut self, caller: &Identity) -> CoreResult<PendingRequest> {
        self.oracle.fulfill(&self.address, caller, self.slot)
    }
}

/// Executes against the session copy while the account is delegated.
pub struct EphemeralExecutor<'a> {
    session: &'a mut EphemeralSession,
    oracle: &'a mut OracleBridge,
    slot: u64,
}

impl<'a> EphemeralExecutor<'a> {
    pub fn new(session: &'a mut EphemeralSession, oracle: &'a mut OracleBridge, slot: u64) -> Self {
        Self { session, oracle, slot }
    }
}

impl AccountExecutor for EphemeralExecutor<'_> {
    fn context(&self) -> ExecutionContext {
        ExecutionContext::Ephemeral
    }

    fn slot(&self) -> u64 {
        self.slot
    }

    fn value(&self) -> CoreResult<u64> {
        Ok(self.session.value())
    }

    fn write_value(&mut self, value: u64) -> CoreResult<()> {
        self.session.write_value(value)
    }

    fn request_randomness(&mut self, kind: RequestKind) -> CoreResult<()> {
        // A frozen session must not accrue callbacks it can never apply.
        if self.session.is_closing() {
            return Err(CoreError::UndelegationPending);
        }
        self.oracle.submit(*self.session.account(), kind, self.slot)
    }

    fn consume_randomness(&mut self, caller: &Identity) -> CoreResult<PendingRequest> {
        self.oracle.fulfill(self.session.account(), caller, self.slot)
    }
}
