#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("amount `{raw}` is not a valid decimal string")]
    InvalidAmountFormat { raw: String },

    #[error("amount has more fractional digits than asset `{asset}` supports ({decimals})")]
    ExcessPrecision { asset: String, decimals: u8 },

    #[error("operation would overflow the underlying i64 atomic amount")]
    Overflow,

    #[error("cannot combine money in `{lhs}` with money in `{rhs}`")]
    AssetMismatch { lhs: String, rhs: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("basis points must be in 0..=10000, got {0}")]
    BasisPointsOutOfRange(u32),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
