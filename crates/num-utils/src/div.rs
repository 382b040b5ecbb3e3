pub trait CheckedDiv<RHS = Self>: Sized {
    fn checked_div(self, rhs: RHS) -> Option<Self>;

    /// Half-up rounding: `|remainder| * 2 >= |divisor|` rounds away from zero.
    fn checked_div_round(self, rhs: RHS) -> Option<Self>;
}

macro_rules! impl_checked_div_unsigned {
    ($($t:ty),+) => {$(
        impl CheckedDiv for $t {
            #[inline]
            fn checked_div(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }

            #[inline]
            fn checked_div_round(self, rhs: Self) -> Option<Self> {
                if rhs == 0 {
                    return None;
                }
                let q = self / rhs;
                let r = self % rhs;
                Some(if r * 2 >= rhs { q + 1 } else { q })
            }
        }
    )+};
}
impl_checked_div_unsigned!(u8, u16, u32, u64, u128);

macro_rules! impl_checked_div_signed {
    ($($t:ty),+) => {$(
        impl CheckedDiv for $t {
            #[inline]
            fn checked_div(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }

            #[inline]
            fn checked_div_round(self, rhs: Self) -> Option<Self> {
                if rhs == 0 {
                    return None;
                }
                let q = self.checked_div(rhs)?;
                let r = self.checked_rem(rhs)?;
                let bias = if r.unsigned_abs() * 2 >= rhs.unsigned_abs() {
                    if (self < 0) == (rhs < 0) { 1 } else { -1 }
                } else {
                    0
                };
                q.checked_add(bias)
            }
        }
    )+};
}
impl_checked_div_signed!(i8, i16, i32, i64, i128);
