#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no row found")]
    NotFound,

    #[error("cart quote has expired")]
    CartExpired,

    #[error("signature has already been used")]
    AlreadyUsed { original_resource_id: String },

    #[error("admin nonce `{0}` already exists")]
    NonceAlreadyExists(String),

    #[error("admin nonce `{id}` cannot be consumed: {reason}")]
    NonceNotConsumable { id: String, reason: &'static str },

    #[error("refund quote `{0}` is already sealed and cannot be denied")]
    CannotDenySealedRefund(String),

    #[error("a refund quote already exists for this original purchase")]
    RefundAlreadyExists(String),

    #[error("batch contains an invalid entry: {0}")]
    InvalidBatch(String),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("store transport error: {0}")]
    Transport(String),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
