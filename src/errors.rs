//! Error taxonomy shared by every operation.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("No account exists for this owner.")]
    NotFound,

    #[error("An account already exists for this owner.")]
    AlreadyExists,

    #[error("A randomness request is already pending for this account.")]
    RequestPending,

    #[error("The account is already delegated to an ephemeral session.")]
    AlreadyDelegated,

    #[error("The account has no active delegation.")]
    NoActiveDelegation,

    #[error("Undelegation was already requested. The session accepts no further writes.")]
    UndelegationPending,

    #[error("Settlement arrived before undelegation was requested.")]
    UndelegationNotRequested,

    #[error("The caller is not authorized to perform this call.")]
    Unauthorized,

    #[error("Received an oracle callback for an account that is not awaiting one.")]
    UnexpectedCallback,

    #[error("The provided seeds do not re-derive the account being finalized.")]
    SeedMismatch,

    #[error("The operation is not allowed while the account is delegated.")]
    DelegationActive,

    #[error("The owner balance cannot cover the account reserve.")]
    InsufficientFunds,

    #[error("The frozen base copy no longer matches the delegation bookkeeping.")]
    StaleBufferState,

    #[error("Stored account bytes failed to decode.")]
    CorruptAccount,
}
