use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The on-chain payment scheme asserted by a proof. `Solana` and
/// `SolanaSplTransfer` are treated as synonyms — both describe "a signed
/// SPL token transfer on Solana" and nothing in this system's behavior
/// distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    SolanaSplTransfer,
}

impl std::str::FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "solana-spl-transfer" | "solana" => Ok(Self::SolanaSplTransfer),
            _ => Err(Error::InvalidTransaction),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("solana-spl-transfer")
    }
}

/// The `payload` object nested inside an [`ProofEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub signature: String,
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_payer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_token_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl Payload {
    /// A transaction with a declared fee-payer is sponsored: the
    /// signature is not yet final, since the server still has to co-sign
    /// and broadcast it.
    pub fn is_sponsored(&self) -> bool {
        self.fee_payer.is_some()
    }
}

/// The parsed `X-PAYMENT` envelope, as asserted by the client. Only its
/// shape is trusted; the amount and wallet it implies are never trusted —
/// those are recomputed and re-derived on-chain respectively.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    x402_version: u32,
    scheme: String,
    network: String,
    payload: Payload,
}

#[derive(Debug, Clone)]
pub struct ProofEnvelope {
    pub x402_version: u32,
    pub scheme: Scheme,
    pub network: String,
    pub payload: Payload,
}

/// Parses the `X-PAYMENT` header value. The header is UTF-8 JSON, optionally
/// base64-wrapped; both forms are accepted.
pub fn parse_envelope(raw: &[u8]) -> Result<ProofEnvelope> {
    use base64::Engine as _;

    let json_bytes = if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(raw) {
        decoded
    } else {
        raw.to_vec()
    };

    let raw: RawEnvelope = serde_json::from_slice(&json_bytes).map_err(|_| Error::InvalidTransaction)?;
    let scheme: Scheme = raw.scheme.parse()?;

    Ok(ProofEnvelope {
        x402_version: raw.x402_version,
        scheme,
        network: raw.network,
        payload: raw.payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_treats_solana_and_spl_transfer_as_synonyms() {
        assert_eq!("solana".parse::<Scheme>().unwrap(), "solana-spl-transfer".parse::<Scheme>().unwrap());
    }

    #[test]
    fn parse_envelope_accepts_plain_json() {
        let json = r#"{
            "x402Version": 1,
            "scheme": "solana-spl-transfer",
            "network": "solana-mainnet",
            "payload": { "signature": "sig123", "transaction": "BASE64==" }
        }"#;
        let envelope = parse_envelope(json.as_bytes()).unwrap();
        assert_eq!(envelope.network, "solana-mainnet");
        assert!(!envelope.payload.is_sponsored());
    }

    #[test]
    fn parse_envelope_accepts_base64_wrapped_json() {
        use base64::Engine as _;
        let json = r#"{"x402Version":1,"scheme":"solana","network":"solana-devnet","payload":{"signature":"s","transaction":"t","feePayer":"payer"}}"#;
        let wrapped = base64::engine::general_purpose::STANDARD.encode(json);
        let envelope = parse_envelope(wrapped.as_bytes()).unwrap();
        assert!(envelope.payload.is_sponsored());
    }

    #[test]
    fn parse_envelope_rejects_unknown_scheme() {
        let json = r#"{"x402Version":1,"scheme":"bitcoin","network":"mainnet","payload":{"signature":"s","transaction":"t"}}"#;
        assert!(parse_envelope(json.as_bytes()).is_err());
    }
}
