use solana_pubkey::Pubkey;
use solana_transaction::Transaction;

use crate::{
    error::{Error, Result},
    requirement::Requirement,
};

/// Decodes the base64 transaction envelope asserted by the proof into the
/// chain's canonical transaction structure. A failure here — malformed
/// base64, malformed bincode — always means `InvalidTransaction`; there is
/// no partial-trust fallback.
pub fn decode_transaction(base64_tx: &str) -> Result<Transaction> {
    use base64::Engine as _;

    let bytes = base64::engine::general_purpose::STANDARD.decode(base64_tx).map_err(|_| Error::InvalidTransaction)?;
    bincode::deserialize(&bytes).map_err(|_| Error::InvalidTransaction)
}

/// The fee-payer slot is always the transaction's first account key.
pub fn fee_payer(tx: &Transaction) -> Pubkey {
    tx.message.account_keys[0]
}

/// A transfer instruction located and decoded out of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTransfer {
    pub authority: Pubkey,
    pub destination: Pubkey,
    pub raw_amount: u64,
    /// `Some(decimals)` when the instruction was the `TransferChecked`
    /// variant, which declares its own decimals for the client to verify
    /// against.
    pub checked_decimals: Option<u8>,
}

fn expected_recipient_token_account(requirement: &Requirement) -> Result<Pubkey> {
    if let Some(explicit) = &requirement.recipient_token_account {
        return explicit.parse().map_err(|_| Error::InvalidRecipient);
    }
    let owner: Pubkey = requirement.recipient_owner.parse().map_err(|_| Error::InvalidRecipient)?;
    let mint: Pubkey = requirement.mint.parse().map_err(|_| Error::InvalidMint)?;
    Ok(spl_associated_token_account::get_associated_token_address(&owner, &mint))
}

/// Walks `tx`'s instructions looking for the single SPL token transfer
/// (plain or checked) addressed to the requirement's recipient token
/// account. Both the classic token program and token-2022 are accepted —
/// their `Transfer`/`TransferChecked` instruction encodings are
/// wire-compatible for the fields this extracts.
pub fn extract_transfer(tx: &Transaction, requirement: &Requirement) -> Result<ExtractedTransfer> {
    let expected_destination = expected_recipient_token_account(requirement)?;
    let account_keys = &tx.message.account_keys;

    for ix in &tx.message.instructions {
        let program_id = match account_keys.get(usize::from(ix.program_id_index)) {
            Some(id) => *id,
            None => continue,
        };
        if program_id != spl_token::id() && program_id != spl_token_2022::id() {
            continue;
        }

        let Ok(parsed) = spl_token::instruction::TokenInstruction::unpack(&ix.data) else {
            continue;
        };

        let (source_idx, destination_idx, authority_idx, raw_amount, checked_decimals) = match parsed {
            spl_token::instruction::TokenInstruction::Transfer { amount } => (0usize, 1usize, 2usize, amount, None),
            spl_token::instruction::TokenInstruction::TransferChecked { amount, decimals } => {
                (0usize, 2usize, 3usize, amount, Some(decimals))
            }
            _ => continue,
        };

        let Some(&destination) = ix.accounts.get(destination_idx).and_then(|i| account_keys.get(usize::from(*i))) else {
            continue;
        };
        if destination != expected_destination {
            continue;
        }

        let Some(&authority) = ix.accounts.get(authority_idx).and_then(|i| account_keys.get(usize::from(*i))) else {
            continue;
        };
        let _source = ix.accounts.get(source_idx);

        if let Some(decimals) = checked_decimals {
            if decimals != requirement.decimals {
                return Err(Error::InvalidMint);
            }
        }

        return Ok(ExtractedTransfer {
            authority,
            destination,
            raw_amount,
            checked_decimals,
        });
    }

    Err(Error::NotSplTransfer)
}

/// Converts a raw atomic transfer amount to a major-unit float and checks
/// it against the requirement with the standard epsilon tolerance. The
/// raw-to-float conversion is inherently lossy for large amounts; this
/// mirrors the external boundary's own float representation rather than
/// introducing false precision.
#[allow(clippy::as_conversions)]
pub fn amount_satisfies(raw_amount: u64, decimals: u8, requirement: &Requirement) -> bool {
    let major = raw_amount as f64 / 10f64.powi(i32::from(decimals));
    major + crate::requirement::AMOUNT_EPSILON >= requirement.expected_amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_satisfies_accepts_exact_match() {
        let requirement = crate::requirement::Requirement {
            resource_id: "r".to_owned(),
            expected_amount: 9.99,
            mint: "mint".to_owned(),
            decimals: 6,
            recipient_owner: "owner".to_owned(),
            recipient_token_account: None,
            network: "solana-mainnet".to_owned(),
            allowed_schemes: vec![],
            commitment: solana_commitment_config::CommitmentConfig::confirmed(),
            skip_preflight: false,
            quote_ttl: chrono::Duration::minutes(10),
            auto_create_ata: false,
        };
        assert!(amount_satisfies(9_990_000, 6, &requirement));
        assert!(!amount_satisfies(9_989_000, 6, &requirement));
    }
}
