use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Which side of the system an [`Asset`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Fiat,
    OnChainToken,
}

/// Gateway-specific metadata carried alongside an [`Asset`]'s decimal shape.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetMetadata {
    Fiat { gateway_currency_code: String },
    OnChainToken { mint_address: String },
}

/// An immutable descriptor for a unit of account, identified by a short,
/// case-sensitive code (e.g. `"USD"`, `"USDC"`, `"SOL"`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Asset {
    code: String,
    decimals: u8,
    category: AssetCategory,
    metadata: AssetMetadata,
}

/// The fixed set of asset codes treated as 1:1 USD equivalents for
/// fixed-amount coupon applicability.
pub const USD_PEGGED: &[&str] = &["USD", "USDC", "USDT", "PYUSD", "CASH"];

/// Maximum decimal precision an [`Asset`] may carry.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("decimals {0} exceeds maximum of {MAX_DECIMALS}")]
    DecimalsOutOfRange(u8),
    #[error("asset code must not be empty")]
    EmptyCode,
}

impl Asset {
    pub fn new(
        code: impl Into<String>,
        decimals: u8,
        category: AssetCategory,
        metadata: AssetMetadata,
    ) -> Result<Self, AssetError> {
        let code = code.into();
        if code.is_empty() {
            return Err(AssetError::EmptyCode);
        }
        if decimals > MAX_DECIMALS {
            return Err(AssetError::DecimalsOutOfRange(decimals));
        }
        Ok(Self {
            code,
            decimals,
            category,
            metadata,
        })
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    #[inline]
    pub fn category(&self) -> AssetCategory {
        self.category
    }

    #[inline]
    pub fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    /// Whether this asset is treated as a 1:1 USD equivalent for fixed-amount
    /// coupon applicability.
    #[inline]
    pub fn is_usd_pegged(&self) -> bool {
        USD_PEGGED.contains(&self.code.as_str())
    }
}

/// Process-wide, read-mostly registry of [`Asset`]s, populated once at init
/// and optionally extended at runtime (e.g. by tests registering synthetic
/// tokens). Lookups are exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    inner: Arc<RwLock<HashMap<String, Asset>>>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `asset`, overwriting any existing entry under the same code.
    pub fn register(&self, asset: Asset) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.insert(asset.code().to_owned(), asset);
    }

    pub fn get(&self, code: &str) -> Option<Asset> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.get(code).cloned()
    }

    pub fn contains(&self, code: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.contains_key(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup_is_case_sensitive() {
        let registry = AssetRegistry::new();
        registry.register(
            Asset::new(
                "USDC",
                6,
                AssetCategory::OnChainToken,
                AssetMetadata::OnChainToken {
                    mint_address: "EPjFW...".to_owned(),
                },
            )
            .unwrap(),
        );

        assert!(registry.get("USDC").is_some());
        assert!(registry.get("usdc").is_none());
    }

    #[test]
    fn rejects_decimals_above_18() {
        let err = Asset::new(
            "XXX",
            19,
            AssetCategory::OnChainToken,
            AssetMetadata::OnChainToken {
                mint_address: String::new(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AssetError::DecimalsOutOfRange(19)));
    }
}
