#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Money(#[from] paywall_money::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
