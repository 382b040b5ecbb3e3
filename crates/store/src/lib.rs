mod error;
mod nonce;
mod payment;
mod store;

pub use self::{
    error::{Error, Result},
    nonce::AdminNonce,
    payment::{PaymentStatus, PaymentTransaction},
    store::Store,
};
