/// The externally-observable error taxonomy for on-chain verification.
/// Every variant's `Display` output is the user-safe message; anything more
/// revealing is logged via `tracing` at the call site rather than embedded
/// here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the transaction could not be decoded or does not match the expected shape")]
    InvalidTransaction,

    #[error("the transfer was not addressed to the expected recipient")]
    InvalidRecipient,

    #[error("the transfer used an unexpected token mint")]
    InvalidMint,

    #[error("no SPL token transfer instruction was found in this transaction")]
    NotSplTransfer,

    #[error("the transferred amount is below the required minimum")]
    AmountBelowMinimum,

    #[error("the wallet does not hold enough of the required token")]
    InsufficientFundsToken,

    #[error("an internal error prevented this transaction from completing")]
    InsufficientFundsFee,

    #[error("the transaction failed on-chain")]
    TransactionFailed,

    #[error("an internal error prevented this transaction from completing")]
    InternalError,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
