use crate::{
    envelope::ProofEnvelope,
    error::{Error, Result},
    requirement::Requirement,
};

/// The proof's scheme must be on the requirement's allowlist and its
/// network must match exactly — neither is negotiable at this layer.
pub fn check_scheme_and_network(envelope: &ProofEnvelope, requirement: &Requirement) -> Result<()> {
    if !requirement.allowed_schemes.contains(&envelope.scheme) {
        return Err(Error::InvalidTransaction);
    }
    if envelope.network != requirement.network {
        return Err(Error::InvalidTransaction);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use solana_commitment_config::CommitmentConfig;

    use super::*;
    use crate::envelope::{Payload, Scheme};

    fn envelope(network: &str) -> ProofEnvelope {
        ProofEnvelope {
            x402_version: 1,
            scheme: Scheme::SolanaSplTransfer,
            network: network.to_owned(),
            payload: Payload {
                signature: "sig".to_owned(),
                transaction: "tx".to_owned(),
                fee_payer: None,
                memo: None,
                recipient_token_account: None,
                metadata: None,
            },
        }
    }

    fn requirement(network: &str) -> Requirement {
        Requirement {
            resource_id: "res".to_owned(),
            expected_amount: 1.0,
            mint: "mint".to_owned(),
            decimals: 6,
            recipient_owner: "owner".to_owned(),
            recipient_token_account: None,
            network: network.to_owned(),
            allowed_schemes: vec![Scheme::SolanaSplTransfer],
            commitment: CommitmentConfig::confirmed(),
            skip_preflight: false,
            quote_ttl: chrono::Duration::minutes(10),
            auto_create_ata: false,
        }
    }

    #[test]
    fn network_mismatch_is_rejected() {
        let err = check_scheme_and_network(&envelope("solana-devnet"), &requirement("solana-mainnet")).unwrap_err();
        assert!(matches!(err, Error::InvalidTransaction));
    }

    #[test]
    fn matching_scheme_and_network_passes() {
        assert!(check_scheme_and_network(&envelope("solana-mainnet"), &requirement("solana-mainnet")).is_ok());
    }
}
