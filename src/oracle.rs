//! Oracle request/callback bridge.
//!
//! Each execution context runs its own bridge, mirroring the split oracle
//! queues: a request made on the base ledger can only be fulfilled there,
//! and likewise for the ephemeral side. Fulfillment is gated on the
//! configured oracle identity before anything else is inspected.

use std::collections::HashMap;

use crate::address::{Address, Identity};
use crate::errors::{CoreError, CoreResult};
use crate::executor::ExecutionContext;

/// What the requester asked the oracle to do with the randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Write the derived value to the account.
    Update,
    /// Write the derived value, then anchor it to the base copy.
    UpdateCommit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub kind: RequestKind,
    pub requested_at_slot: u64,
}

pub struct OracleBridge {
    context: ExecutionContext,
    oracle_identity: Identity,
    timeout_slots: u64,
    pending: HashMap<Address, PendingRequest>,
}

impl OracleBridge {
    pub fn new(context: ExecutionContext, oracle_identity: Identity, timeout_slots: u64) -> Self {
        Self {
            context,
            oracle_identity,
            timeout_slots,
            pending: HashMap::new(),
        }
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    fn is_expired(&self, request: &PendingRequest, now_slot: u64) -> bool {
        now_slot.saturating_sub(request.requested_at_slot) > self.timeout_slots
    }

    /// Registers a request for `account`. At most one live request per
    /// account; an expired one is silently replaced by the retry.
    pub fn submit(&mut self, account: Address, kind: RequestKind, now_slot: u64) -> CoreResult<()> {
        if let Some(existing) = self.pending.get(&account) {
            if !self.is_expired(existing, now_slot) {
                return Err(CoreError::RequestPending);
            }
            log::warn!(
                "request for {account} from slot {} expired, accepting retry",
                existing.requested_at_slot
            );
        }
        self.pending.insert(account, PendingRequest { kind, requested_at_slot: now_slot });
        log::info!("randomness requested for {account} on {} ({kind:?})", self.context);
        Ok(())
    }

    /// Claims the pending request for `account`.
    ///
    /// The identity gate runs first: a caller that is not the oracle learns
    /// nothing about pending state. A callback for an absent or expired
    /// request is rejected; the expired entry is dropped in passing.
    pub fn fulfill(&mut self, account: &Address, caller: &Identity, now_slot: u64) -> CoreResult<PendingRequest> {
        if *caller != self.oracle_identity {
            return Err(CoreError::Unauthorized);
        }
        match self.pending.remove(account) {
            None => Err(CoreError::UnexpectedCallback),
            Some(request) if self.is_expired(&request, now_slot) => {
                log::warn!("late callback for {account}, request from slot {} already expired", request.requested_at_slot);
                Err(CoreError::UnexpectedCallback)
            }
            Some(request) => Ok(request),
        }
    }

    /// Drops the pending request, if any. Used when the account changes
    /// context and a late callback must no longer land.
    pub fn cancel(&mut self, account: &Address) -> Option<PendingRequest> {
        let dropped = self.pending.remove(account);
        if dropped.is_some() {
            log::debug!("canceled pending request for {account} on {}", self.context);
        }
        dropped
    }

    pub fn pending(&self, account: &Address) -> Option<&PendingRequest> {
        self.pending.get(account)
    }

    pub fn is_awaiting(&self, account: &Address, now_slot: u64) -> bool {
        self.pending
            .get(account)
            .map(|request| !self.is_expired(request, now_slot))
            .unwrap_or(false)
    }
}

/// Derives the account value from a randomness payload: little-endian u64
/// from the first eight bytes.
pub fn derive_value(randomness: &[u8; 32]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&randomness[..8]);
    u64::from_le_bytes(bytes)
}
