mod asset;
mod error;
mod money;

pub use self::{
    asset::{Asset, AssetCategory, AssetError, AssetMetadata, AssetRegistry, MAX_DECIMALS, USD_PEGGED},
    error::{Error, Result},
    money::{Money, RoundingMode},
};
