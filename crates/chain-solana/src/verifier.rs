use std::time::Duration;

use solana_pubkey::Pubkey;
use solana_signature::Signature;
use tokio_util::sync::CancellationToken;

use crate::{
    autocreate::{self, FeePayerSigner},
    confirm::{self, ChainClient, ConfirmationSubscriber},
    envelope::parse_envelope,
    error::{Error, Result},
    guard::check_scheme_and_network,
    requirement::Requirement,
    transaction::{amount_satisfies, decode_transaction, extract_transfer, fee_payer},
};

/// What survives verification: the payer's wallet, the amount actually
/// moved, the settlement signature, and whether the server had to sponsor
/// the transaction's fee.
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub wallet: Pubkey,
    pub amount_raw: u64,
    pub decimals: u8,
    pub signature: Signature,
    pub sponsored: bool,
}

/// Runs the full on-chain verification algorithm against a single asserted
/// proof: parse the envelope, check scheme/network, decode the transaction,
/// locate its transfer instruction, confirm the asserted fee-payer for
/// sponsored transactions, check the amount, broadcast (sponsored case) or
/// trust the client's own signature (non-sponsored case), then await
/// confirmation to the requirement's commitment level.
///
/// Non-sponsored transactions are never broadcast by this function — the
/// caller's on-chain client is assumed to have already seen the signature
/// land, since the client signed and sent it themselves.
pub async fn verify_payment(
    raw_envelope: &[u8],
    requirement: &Requirement,
    client: &dyn ChainClient,
    subscriber: Option<&dyn ConfirmationSubscriber>,
    fee_payer_signer: Option<&dyn FeePayerSigner>,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<VerifiedPayment> {
    let envelope = parse_envelope(raw_envelope)?;
    check_scheme_and_network(&envelope, requirement)?;

    let tx = decode_transaction(&envelope.payload.transaction)?;
    let transfer = extract_transfer(&tx, requirement)?;

    let sponsored = envelope.payload.is_sponsored();
    if sponsored {
        let declared: Pubkey = envelope
            .payload
            .fee_payer
            .as_deref()
            .ok_or(Error::InvalidTransaction)?
            .parse()
            .map_err(|_| Error::InvalidTransaction)?;
        if declared != fee_payer(&tx) {
            return Err(Error::InvalidTransaction);
        }
    }

    let effective_decimals = transfer.checked_decimals.unwrap_or(requirement.decimals);
    if !amount_satisfies(transfer.raw_amount, effective_decimals, requirement) {
        return Err(Error::AmountBelowMinimum);
    }

    let signature = if sponsored {
        let signer = fee_payer_signer.ok_or(Error::InternalError)?;

        if requirement.auto_create_ata && !client.account_exists(&transfer.destination).await? {
            let owner: Pubkey = requirement.recipient_owner.parse().map_err(|_| Error::InvalidRecipient)?;
            let mint: Pubkey = requirement.mint.parse().map_err(|_| Error::InvalidMint)?;
            autocreate::auto_create_token_account(client, signer, &owner, &mint, cancel).await?;
        }

        client.broadcast_sponsored(&tx, signer, requirement.skip_preflight).await?
    } else {
        envelope.payload.signature.parse().map_err(|_| Error::InvalidTransaction)?
    };

    confirm::await_confirmation(client, subscriber, &signature, requirement.commitment, poll_interval, cancel).await?;

    Ok(VerifiedPayment {
        wallet: transfer.authority,
        amount_raw: transfer.raw_amount,
        decimals: effective_decimals,
        signature,
        sponsored,
    })
}
