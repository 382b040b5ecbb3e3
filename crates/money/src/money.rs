use std::fmt;

use paywall_num_utils::CheckedDiv;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    asset::Asset,
    error::{Error, Result},
};

/// Controls how a fractional basis-point multiplication resolves its
/// sub-unit remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    /// `|remainder| * 2 >= divisor` rounds away from zero.
    HalfUp,
    /// Any non-zero remainder rounds toward positive infinity.
    Ceiling,
}

/// A monetary amount denominated in an [`Asset`], stored as an atomic
/// integer (the asset's smallest indivisible unit — e.g. cents for a
/// 2-decimal fiat currency, or the mint's base unit for an SPL token).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Money {
    asset: Asset,
    #[serde_as(as = "DisplayFromStr")]
    atomic: i64,
}

impl Money {
    pub fn zero(asset: Asset) -> Self {
        Self { asset, atomic: 0 }
    }

    pub fn from_atomic(asset: Asset, atomic: i64) -> Self {
        Self { asset, atomic }
    }

    /// Parses a human-entered decimal string (`"12.50"`, `"-3"`, `"0.1234567"`)
    /// into atomic units for `asset`. Fractional digits beyond the asset's
    /// precision are resolved via half-up rounding rather than rejected.
    pub fn from_major(asset: Asset, raw: &str) -> Result<Self> {
        let atomic = parse_decimal(raw, asset.decimals())?;
        Ok(Self { asset, atomic })
    }

    /// Renders the amount as a fixed-point decimal string with exactly
    /// `asset.decimals()` fractional digits.
    pub fn to_major(&self) -> String {
        format_decimal(self.atomic, self.asset.decimals())
    }

    #[inline]
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    #[inline]
    pub fn atomic(&self) -> i64 {
        self.atomic
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.atomic == 0
    }

    fn require_same_asset(&self, other: &Self) -> Result<()> {
        if self.asset != other.asset {
            return Err(Error::AssetMismatch {
                lhs: self.asset.code().to_owned(),
                rhs: other.asset.code().to_owned(),
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self> {
        self.require_same_asset(other)?;
        let atomic = self.atomic.checked_add(other.atomic).ok_or(Error::Overflow)?;
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        self.require_same_asset(other)?;
        let atomic = self.atomic.checked_sub(other.atomic).ok_or(Error::Overflow)?;
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    /// Scales the amount by an integer quantity (e.g. a cart line's unit
    /// price times its item count).
    pub fn checked_mul(&self, quantity: i64) -> Result<Self> {
        let atomic = self.atomic.checked_mul(quantity).ok_or(Error::Overflow)?;
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    /// Divides the amount by an integer divisor, rounding the quotient
    /// half-up.
    pub fn checked_div(&self, divisor: i64) -> Result<Self> {
        if divisor == 0 {
            return Err(Error::DivisionByZero);
        }
        let atomic = self.atomic.checked_div_round(divisor).ok_or(Error::Overflow)?;
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    /// Multiplies by `basis_points / 10_000` (e.g. 250 == 2.5%), resolving
    /// the sub-unit remainder per `rounding`: `floor((atomic·bp + bias) /
    /// 10_000)`, using true (sign-aware) floor division rather than Rust's
    /// toward-zero integer division — the two only differ when the
    /// numerator is negative, which stacking only feeds a positive `Money`
    /// today, but a negative amount (a refund delta, say) must still floor
    /// toward `-∞` rather than truncate toward zero.
    pub fn mul_basis_points(&self, basis_points: u32, rounding: RoundingMode) -> Result<Self> {
        if basis_points > 10_000 {
            return Err(Error::BasisPointsOutOfRange(basis_points));
        }
        let bias: i128 = match rounding {
            RoundingMode::HalfUp => 5_000,
            RoundingMode::Ceiling => 9_999,
        };
        let wide = i128::from(self.atomic)
            .checked_mul(i128::from(basis_points))
            .ok_or(Error::Overflow)?
            .checked_add(bias)
            .ok_or(Error::Overflow)?;
        let atomic = i64::try_from(wide.div_euclid(10_000)).map_err(|_| Error::Overflow)?;
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    /// Discounts the amount by `percent_bp / 100` percent (e.g. `1000` ==
    /// 10%), equivalent to multiplying by the remaining share directly
    /// rather than rounding a subtracted discount. `percent_bp` of `0` or
    /// `10_000` (100%) short-circuit without going through the rounded
    /// multiplication at all.
    pub fn apply_percentage_discount(&self, percent_bp: u32, rounding: RoundingMode) -> Result<Self> {
        if percent_bp == 0 {
            return Ok(self.clone());
        }
        if percent_bp >= 10_000 {
            return Ok(Self {
                asset: self.asset.clone(),
                atomic: 0,
            });
        }
        self.mul_basis_points(10_000 - percent_bp, rounding)
    }

    /// Subtracts a fixed amount, floored at zero rather than going negative
    /// or erroring when the discount exceeds the amount.
    pub fn apply_fixed_discount(&self, discount: &Self) -> Result<Self> {
        self.require_same_asset(discount)?;
        let atomic = self.atomic.saturating_sub(discount.atomic).max(0);
        Ok(Self {
            asset: self.asset.clone(),
            atomic,
        })
    }

    /// Snaps to the nearest cent-equivalent unit (`10^(decimals - 2)` atomic
    /// units). Positive amounts round toward `+∞`; negative amounts round
    /// toward zero (the less-negative floor). A no-op for assets with
    /// `decimals <= 2`.
    pub fn round_up_to_cents(&self) -> Self {
        let decimals = self.asset.decimals();
        if decimals <= 2 {
            return self.clone();
        }
        let unit = 10i64.pow(u32::from(decimals - 2));
        let atomic = if self.atomic >= 0 {
            self.atomic.div_ceil(unit) * unit
        } else {
            (self.atomic / unit) * unit
        };
        Self {
            asset: self.asset.clone(),
            atomic,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_major(), self.asset.code())
    }
}

fn parse_decimal(raw: &str, decimals: u8) -> Result<i64> {
    let trimmed = raw.trim();
    let invalid = || Error::InvalidAmountFormat { raw: raw.to_owned() };

    let negative = trimmed.starts_with('-');
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);

    let mut split = unsigned.splitn(2, '.');
    let int_part = split.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let frac_part = split.next().unwrap_or("");

    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let scale = 10i128.pow(u32::from(decimals));
    let int_value: i128 = int_part.parse().map_err(|_| invalid())?;
    let mut wide = int_value.checked_mul(scale).ok_or(Error::Overflow)?;

    let decimals = usize::from(decimals);
    if frac_part.len() <= decimals {
        if !frac_part.is_empty() {
            let pad_exponent = u32::try_from(decimals - frac_part.len()).unwrap_or_default();
            let pad = 10i128.pow(pad_exponent);
            let frac_value: i128 = frac_part.parse().map_err(|_| invalid())?;
            wide = wide
                .checked_add(frac_value.checked_mul(pad).ok_or(Error::Overflow)?)
                .ok_or(Error::Overflow)?;
        }
    } else {
        let (kept, rest) = frac_part.split_at(decimals);
        if !kept.is_empty() {
            let kept_value: i128 = kept.parse().map_err(|_| invalid())?;
            wide = wide.checked_add(kept_value).ok_or(Error::Overflow)?;
        }
        let first_dropped = rest.as_bytes()[0] - b'0';
        if first_dropped >= 5 {
            wide = wide.checked_add(1).ok_or(Error::Overflow)?;
        }
    }

    if negative {
        wide = -wide;
    }
    i64::try_from(wide).map_err(|_| Error::Overflow)
}

fn format_decimal(atomic: i64, decimals: u8) -> String {
    let scale = 10i128.pow(u32::from(decimals));
    let negative = atomic < 0;
    let abs = i128::from(atomic).unsigned_abs();
    let scale = scale.unsigned_abs();
    let int_part = abs / scale;
    let sign = if negative { "-" } else { "" };
    if decimals == 0 {
        return format!("{sign}{int_part}");
    }
    let frac_part = abs % scale;
    format!("{sign}{int_part}.{frac_part:0width$}", width = usize::from(decimals))
}
