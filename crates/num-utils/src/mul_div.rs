use core::ops::Mul;

use bnum::{BInt, BUint, cast::As};

/// `checked_mul_div` family perform `self * mul / div` through a widened
/// intermediate so the multiplication itself cannot silently wrap before
/// the division narrows the result back down.
pub trait CheckedMulDiv<RHS = Self>: Sized {
    fn checked_mul_div(self, mul: RHS, div: RHS) -> Option<Self>;
    fn checked_mul_div_ceil(self, mul: RHS, div: RHS) -> Option<Self>;
}

macro_rules! impl_checked_mul_div {
    ($t:ty as $h:ty) => {
        impl CheckedMulDiv for $t {
            #[inline]
            fn checked_mul_div(self, mul: Self, div: Self) -> Option<Self> {
                if div == 0 {
                    return None;
                }
                self.as_::<$h>()
                    .mul(mul.as_::<$h>())
                    .checked_div(div.as_::<$h>())?
                    .try_into()
                    .ok()
            }

            #[inline]
            fn checked_mul_div_ceil(self, mul: Self, div: Self) -> Option<Self> {
                if div == 0 {
                    return None;
                }
                self.as_::<$h>()
                    .mul(mul.as_::<$h>())
                    .div_ceil(div.as_::<$h>())
                    .try_into()
                    .ok()
            }
        }
    };
}
impl_checked_mul_div!(i64 as i128);
impl_checked_mul_div!(u64 as u128);
impl_checked_mul_div!(u128 as BUint<4>);
impl_checked_mul_div!(i128 as BInt<4>);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1_000_000, 9_000, 10_000, 900_000)]
    #[case(220_000, 1, 1, 220_000)]
    fn floor(#[case] n: i64, #[case] mul: i64, #[case] div: i64, #[case] expected: i64) {
        assert_eq!(n.checked_mul_div(mul, div), Some(expected));
    }

    #[test]
    fn div_by_zero() {
        assert_eq!(1i64.checked_mul_div(1, 0), None);
    }

    #[test]
    fn overflow_detected() {
        assert_eq!(i64::MAX.checked_mul_div(i64::MAX, 1), None);
    }
}
