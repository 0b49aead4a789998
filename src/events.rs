//! Events appended by the engine, one per successful state transition.
//! Failed operations never emit.

use crate::address::{Address, Identity};
use crate::executor::ExecutionContext;
use crate::oracle::RequestKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Initialized {
        account: Address,
        owner: Identity,
    },
    RandomnessRequested {
        account: Address,
        context: ExecutionContext,
        kind: RequestKind,
    },
    RandomnessFulfilled {
        account: Address,
        context: ExecutionContext,
        value: u64,
    },
    ValueSet {
        account: Address,
        context: ExecutionContext,
        value: u64,
    },
    Delegated {
        account: Address,
        validator: Identity,
    },
    Committed {
        account: Address,
        value: u64,
    },
    UndelegationRequested {
        account: Address,
    },
    Undelegated {
        account: Address,
        value: u64,
    },
    Closed {
        account: Address,
        owner: Identity,
    },
}
