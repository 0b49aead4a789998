//! Delegatable, oracle-fed state account.
//!
//! Each owner gets one record at a derived address. The record can request
//! async oracle randomness, be delegated into a fast ephemeral session,
//! commit intermediate state back to the durable base copy, and settle
//! through an exactly-once undelegation handshake.
//!
//! [`DelegationEngine`] is the front door; everything else is the machinery
//! behind it.

pub mod address;
pub mod commit;
pub mod config;
pub mod delegate;
pub mod engine;
pub mod errors;
pub mod events;
pub mod executor;
pub mod oracle;
pub mod session;
pub mod state;
pub mod store;

pub use address::{
    buffer_address, derive_address, user_account_address, user_account_seeds, Address, Identity,
};
pub use config::Config;
pub use engine::DelegationEngine;
pub use errors::{CoreError, CoreResult};
pub use events::Event;
pub use executor::ExecutionContext;
pub use oracle::{derive_value, PendingRequest, RequestKind};
pub use state::{BufferAccount, DelegationMetadata, DelegationRecord, UserAccount};
