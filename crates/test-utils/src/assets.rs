use paywall_money::{Asset, AssetCategory, AssetMetadata};

pub fn usdc() -> Asset {
    Asset::new(
        "USDC",
        6,
        AssetCategory::OnChainToken,
        AssetMetadata::OnChainToken {
            mint_address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_owned(),
        },
    )
    .expect("fixture asset is well-formed")
}

pub fn sol() -> Asset {
    Asset::new(
        "SOL",
        9,
        AssetCategory::OnChainToken,
        AssetMetadata::OnChainToken {
            mint_address: "So11111111111111111111111111111111111111112".to_owned(),
        },
    )
    .expect("fixture asset is well-formed")
}

pub fn usd() -> Asset {
    Asset::new(
        "USD",
        2,
        AssetCategory::Fiat,
        AssetMetadata::Fiat {
            gateway_currency_code: "usd".to_owned(),
        },
    )
    .expect("fixture asset is well-formed")
}
