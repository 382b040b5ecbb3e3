#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no healthy wallet is available in the pool")]
    NoHealthyWallet,

    #[error("wallet `{0}` is not a member of this pool")]
    UnknownWallet(String),

    #[error("balance lookup failed: {0}")]
    BalanceLookup(String),

    #[error("operation was cancelled")]
    Cancelled,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
