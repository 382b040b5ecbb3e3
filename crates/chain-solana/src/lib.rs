mod autocreate;
mod confirm;
mod envelope;
mod error;
mod guard;
mod requirement;
mod transaction;
mod verifier;

pub use self::{
    autocreate::{FeePayerSigner, auto_create_token_account},
    confirm::{BLOCKHASH_VALIDITY, ChainClient, ConfirmationStatus, ConfirmationSubscriber, await_confirmation},
    envelope::{Payload, ProofEnvelope, Scheme, parse_envelope},
    error::{Error, Result},
    guard::check_scheme_and_network,
    requirement::{AMOUNT_EPSILON, Requirement},
    transaction::{ExtractedTransfer, amount_satisfies, decode_transaction, extract_transfer, fee_payer},
    verifier::{VerifiedPayment, verify_payment},
};
