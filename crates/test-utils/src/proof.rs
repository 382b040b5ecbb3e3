use solana_message::Message;
use solana_pubkey::Pubkey;
use solana_transaction::Transaction;

/// Builds a well-formed `X-PAYMENT` proof envelope around a single SPL
/// `TransferChecked` instruction, so integration tests can exercise the
/// verifier without hand-rolling bincode/base64 plumbing. Mirrors exactly
/// what `paywall_chain_solana::transaction::extract_transfer` looks for:
/// source/mint/destination/authority at the `TransferChecked` account
/// indices the token program defines.
pub struct ProofBuilder {
    authority: Pubkey,
    destination: Pubkey,
    mint: Pubkey,
    amount: u64,
    decimals: u8,
    signature: String,
    scheme: String,
    network: String,
    sponsor_fee_payer: Option<Pubkey>,
}

/// Expands an arbitrary seed string into a valid base58-encoded 64-byte
/// signature. The verifier's non-sponsored path round-trips the envelope's
/// claimed signature through `Signature::from_str`, which rejects anything
/// that doesn't base58-decode to exactly 64 bytes — a human-readable seed
/// like `"shared-sig"` needs expanding, not using as-is, to stand in for a
/// real signature while staying deterministic (same seed -> same
/// signature, so replay/idempotency tests that reuse a seed see the same
/// ledger key).
fn expand_seed_to_signature(seed: &str) -> String {
    let bytes = seed.as_bytes();
    debug_assert!(!bytes.is_empty(), "signature seed must not be empty");
    let mut expanded = [0u8; 64];
    for (i, byte) in expanded.iter_mut().enumerate() {
        *byte = bytes[i % bytes.len()];
    }
    bs58::encode(expanded).into_string()
}

impl ProofBuilder {
    pub fn new(authority: Pubkey, destination: Pubkey, mint: Pubkey, amount: u64, decimals: u8) -> Self {
        Self {
            authority,
            destination,
            mint,
            amount,
            decimals,
            signature: format!("sig-{authority}-{amount}"),
            scheme: "solana-spl-transfer".to_owned(),
            network: "solana-mainnet".to_owned(),
            sponsor_fee_payer: None,
        }
    }

    /// Sets the seed used to derive this proof's signature (see
    /// [`expand_seed_to_signature`]) — not the literal on-wire signature.
    #[must_use]
    pub fn signature(mut self, seed: impl Into<String>) -> Self {
        self.signature = seed.into();
        self
    }

    #[must_use]
    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Marks the proof sponsored: a distinct server wallet occupies the
    /// fee-payer slot instead of the customer's own wallet, and the
    /// envelope asserts that wallet's address.
    #[must_use]
    pub fn sponsored_by(mut self, fee_payer: Pubkey) -> Self {
        self.sponsor_fee_payer = Some(fee_payer);
        self
    }

    /// Serializes the unsigned transaction and wraps it in the JSON
    /// envelope format `paywall_chain_solana::parse_envelope` expects,
    /// returning the raw (non-base64-wrapped) UTF-8 bytes alongside the
    /// actual signature string landing in the envelope and thus in the
    /// replay ledger, so callers never have to re-derive it by hand.
    pub fn build(self) -> (Vec<u8>, String) {
        let source = Pubkey::new_unique();
        let instruction = spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &source,
            &self.mint,
            &self.destination,
            &self.authority,
            &[],
            self.amount,
            self.decimals,
        )
        .expect("well-formed transfer_checked instruction");

        let fee_payer = self.sponsor_fee_payer.unwrap_or(self.authority);
        let message = Message::new(&[instruction], Some(&fee_payer));
        let tx = Transaction::new_unsigned(message);
        let tx_bytes = bincode::serialize(&tx).expect("transaction serializes");

        use base64::Engine as _;
        let tx_b64 = base64::engine::general_purpose::STANDARD.encode(tx_bytes);

        let fee_payer_field = self
            .sponsor_fee_payer
            .map(|pk| format!(r#","feePayer":"{pk}""#))
            .unwrap_or_default();

        let signature = expand_seed_to_signature(&self.signature);

        let envelope = format!(
            r#"{{"x402Version":1,"scheme":"{scheme}","network":"{network}","payload":{{"signature":"{signature}","transaction":"{tx_b64}"{fee_payer_field}}}}}"#,
            scheme = self.scheme,
            network = self.network,
        )
        .into_bytes();

        (envelope, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::expand_seed_to_signature;

    #[test]
    fn same_seed_expands_to_the_same_signature() {
        assert_eq!(expand_seed_to_signature("shared-sig"), expand_seed_to_signature("shared-sig"));
        assert_ne!(expand_seed_to_signature("shared-sig"), expand_seed_to_signature("other-sig"));
    }

    #[test]
    fn expanded_signature_round_trips_through_bs58_as_64_bytes() {
        let encoded = expand_seed_to_signature("sig-seed");
        let decoded = bs58::decode(&encoded).into_vec().unwrap();
        assert_eq!(decoded.len(), 64);
    }
}
